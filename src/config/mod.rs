//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server.toml
//!     → loader.rs (parse & deserialize)
//!     → routes.json / bundles.json / template.hbs (site files)
//!     → validation.rs (semantic checks)
//!     → ServerConfig + SiteAssets (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_site, ConfigError, SiteAssets};
pub use schema::{Environment, ListenerConfig, ServerConfig, SiteConfig};
