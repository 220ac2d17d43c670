//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Matched chain (root → leaf)
//!     → chain.rs (handlers build the shared context, strictly in order)
//!     → composer.rs (components fold into one nested markup tree)
//!     → page.rs (context serialized, template emits the final HTML)
//! ```
//!
//! # Design Decisions
//! - One RenderContext per request; handlers are the only writers
//! - Component loads are concurrent, the nesting fold is ordered
//! - Every stage fails fast and labels its errors; nothing is retried

pub mod chain;
pub mod composer;
pub mod context;
pub mod page;

pub use chain::{run_handlers, ChainError};
pub use composer::{compose, ComposeError};
pub use context::{CurrentRoute, RenderContext, RequestMeta};
pub use page::{PageError, PageRenderer};

use crate::routing::tree::MatchedRoute;

/// The finished output of the render pipeline for one request.
///
/// Immutable once the orchestrator hands it off; the page stage consumes it
/// to emit HTML.
#[derive(Debug)]
pub struct RenderObject {
    /// Deduplicated style-asset paths for the matched components.
    pub css_trace: Vec<String>,

    /// The composed component markup.
    pub component: String,

    /// The context the handler chain built.
    pub context: RenderContext,

    /// The matched chain, root to leaf.
    pub routes: Vec<MatchedRoute>,
}
