//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! routes.json (nested route definitions)
//!     → tree.rs (parse into immutable RouteTree)
//!
//! Incoming request path
//!     → matcher.rs (recursive depth-first resolution)
//!     → pattern.rs (segment matching, parameter capture)
//!     → Return: matched chain (root → leaf) or NoMatch
//! ```
//!
//! # Design Decisions
//! - Route tree parsed once at startup, immutable at runtime
//! - Matching is pure and synchronous; deterministic for a given tree
//! - NoMatch is an explicit `None`, never a degraded partial chain

pub mod matcher;
pub mod pattern;
pub mod tree;

pub use matcher::match_path;
pub use pattern::Pattern;
pub use tree::{MatchResult, MatchedRoute, RouteTree, TreeError};
