//! Handler chain execution.
//!
//! # Responsibilities
//! - Resolve each matched route's handler module
//! - Invoke handlers in chain order against the shared context
//!
//! # Design Decisions
//! - Server-only handlers take precedence; shared handlers are the fallback,
//!   consulted only when no server handler is declared
//! - Strictly sequential: a handler only starts after its predecessor has
//!   fully settled, since it may depend on state the predecessor wrote
//! - Fail-fast: the first resolution or invocation failure aborts the chain

use thiserror::Error;

use crate::render::context::RenderContext;
use crate::resolve::{HandlerError, HandlerRef, ModuleResolver, ResolveError};
use crate::routing::tree::MatchedRoute;

/// Error raised while running the handler chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A declared handler module could not be resolved.
    #[error("route '{route}': {source}")]
    Resolve {
        route: String,
        #[source]
        source: ResolveError,
    },

    /// A handler ran and failed.
    #[error("route '{route}': handler failed: {source}")]
    Handler {
        route: String,
        #[source]
        source: HandlerError,
    },
}

/// Resolve the handler serving `route`, if it declares one.
///
/// `serverHandler` wins; `handler` is the fallback.
pub async fn route_handler(
    route: &MatchedRoute,
    resolver: &dyn ModuleResolver,
) -> Result<Option<HandlerRef>, ChainError> {
    let id = match (&route.server_handler, &route.handler) {
        (Some(id), _) => id,
        (None, Some(id)) => id,
        (None, None) => return Ok(None),
    };
    resolver
        .handler(id)
        .await
        .map(Some)
        .map_err(|source| ChainError::Resolve {
            route: route.path.clone(),
            source,
        })
}

/// Run the matched chain's handlers against `ctx`, root to leaf.
pub async fn run_handlers(
    chain: &[MatchedRoute],
    resolver: &dyn ModuleResolver,
    ctx: &mut RenderContext,
) -> Result<(), ChainError> {
    for route in chain {
        let Some(handler) = route_handler(route, resolver).await? else {
            continue;
        };

        tracing::debug!(route = %route.path, "running handler");
        handler
            .handle(ctx)
            .await
            .map_err(|source| ChainError::Handler {
                route: route.path.clone(),
                source,
            })?;
    }
    Ok(())
}
