//! Strata: nested-route server-side rendering engine.
//!
//! An incoming request path is resolved against a tree of nested route
//! definitions; the matched chain's server handlers build a shared render
//! context; the chain's components compose into one nested markup tree with
//! their transitive style-sheet dependencies traced and deduplicated; and a
//! Handlebars template emits the final page.

// Core engine
pub mod bundles;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod routing;
pub mod trace;

// Cross-cutting concerns
pub mod config;
pub mod http;

pub use config::{load_site, ServerConfig, SiteAssets};
pub use http::HttpServer;
pub use pipeline::{RenderError, RenderOrchestrator};
pub use render::{RenderContext, RenderObject, RequestMeta};
pub use resolve::{Component, Handler, ModuleRegistry, ModuleResolver};
pub use routing::{MatchResult, MatchedRoute, RouteTree};
pub use trace::{DependencyTracer, ManifestTracer};
