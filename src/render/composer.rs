//! Component composition.
//!
//! # Responsibilities
//! - Load every matched route's component module
//! - Fold the chain into one nested markup tree
//!
//! # Design Decisions
//! - Loads are concurrent; nothing about them is order-sensitive
//! - The fold is strictly ordered: the root route's component is the
//!   outermost wrapper, the leaf route's the innermost element
//! - Routes without a component get an identity pass-through, so the chain
//!   shape never changes the nesting of the routes around it

use futures_util::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::render::context::RenderContext;
use crate::resolve::{ComponentRef, IdentityComponent, ModuleResolver, ResolveError};
use crate::routing::tree::MatchedRoute;

/// Error raised while composing the component tree.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A declared component module could not be resolved.
    #[error("route '{route}': {source}")]
    Resolve {
        route: String,
        #[source]
        source: ResolveError,
    },
}

/// Compose the chain's components into a single markup string.
///
/// The chain is consumed general to specific: for routes `[A, B]` the output
/// is A's markup wrapping B's.
pub async fn compose(
    chain: &[MatchedRoute],
    resolver: &dyn ModuleResolver,
    ctx: &RenderContext,
) -> Result<String, ComposeError> {
    let components = load_components(chain, resolver).await?;

    // Innermost first: wrap outward so the root ends up on the outside.
    let mut markup = String::new();
    for component in components.iter().rev() {
        markup = component.render(ctx, &markup);
    }
    Ok(markup)
}

/// Load every route's component concurrently, in chain order.
async fn load_components(
    chain: &[MatchedRoute],
    resolver: &dyn ModuleResolver,
) -> Result<Vec<ComponentRef>, ComposeError> {
    try_join_all(chain.iter().map(|route| async move {
        match route.component.as_deref() {
            Some(id) => {
                resolver
                    .component(id)
                    .await
                    .map_err(|source| ComposeError::Resolve {
                        route: route.path.clone(),
                        source,
                    })
            }
            None => Ok(Arc::new(IdentityComponent) as ComponentRef),
        }
    }))
    .await
}
