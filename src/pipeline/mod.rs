//! Render pipeline orchestration.
//!
//! # Data Flow
//! ```text
//! Request path + metadata
//!     → routing (matched chain, or 404 for the caller to handle)
//!     → style tracing starts (needs only the matched module ids)
//!     → handler chain (builds the context, strictly ordered)
//!     → component composition (concurrent loads, ordered fold)
//!     → bundle visibility + context serialization
//!     → page template → HTML
//! ```
//!
//! # Design Decisions
//! - NoMatch is `None`, not an error; only real failures are `Err`
//! - Every stage failure carries a stage label and the underlying cause
//! - No stage retries; recovery belongs to the caller

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ServerConfig, SiteAssets};
use crate::render::chain::ChainError;
use crate::render::composer::ComposeError;
use crate::render::page::PageError;
use crate::render::{compose, run_handlers, CurrentRoute, PageRenderer, RenderContext, RenderObject, RequestMeta};
use crate::resolve::ModuleResolver;
use crate::routing::tree::MatchResult;
use crate::routing::{matcher, RouteTree};
use crate::trace::{trace_css, DependencyTracer, TraceError};

/// A pipeline stage failure, labeled with the stage it came from.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Error running handler chain: {0}")]
    Handlers(#[from] ChainError),

    #[error("Error rendering component: {0}")]
    Component(#[from] ComposeError),

    #[error("Error tracing css: {0}")]
    CssTrace(#[from] TraceError),

    #[error("Error rendering page: {0}")]
    Page(#[from] PageError),
}

/// The end-to-end rendering pipeline for one site.
///
/// Holds the immutable route tree and template alongside the injected
/// resolver and tracer capabilities; every request flows through [`render`]
/// with its own context.
///
/// [`render`]: RenderOrchestrator::render
pub struct RenderOrchestrator {
    tree: RouteTree,
    resolver: Arc<dyn ModuleResolver>,
    tracer: Arc<dyn DependencyTracer>,
    page: PageRenderer,
}

impl RenderOrchestrator {
    pub fn new(
        config: &ServerConfig,
        assets: SiteAssets,
        resolver: Arc<dyn ModuleResolver>,
        tracer: Arc<dyn DependencyTracer>,
    ) -> Result<Self, PageError> {
        let page = PageRenderer::new(config, &assets.template, &assets.tree, assets.bundles)?;
        Ok(Self {
            tree: assets.tree,
            resolver,
            tracer,
            page,
        })
    }

    /// Resolve a path against the route tree without rendering.
    pub fn match_path(&self, path: &str) -> Option<MatchResult> {
        matcher::match_path(path, &self.tree)
    }

    /// Run the pipeline up to a finished [`RenderObject`].
    ///
    /// `None` means no route matched.
    pub async fn render_routes(
        &self,
        path: &str,
        request: RequestMeta,
    ) -> Result<Option<RenderObject>, RenderError> {
        let Some(MatchResult { options, routes }) = self.match_path(path) else {
            tracing::debug!(path, "no route matched");
            return Ok(None);
        };
        tracing::debug!(path, depth = routes.len(), "route matched");

        // The trace needs only the matched module ids, so it starts here and
        // overlaps the handler chain and composition.
        let modules: Vec<String> = routes
            .iter()
            .filter_map(|route| route.component.clone())
            .collect();
        let tracer = Arc::clone(&self.tracer);
        let trace_task = tokio::spawn(async move { trace_css(tracer.as_ref(), &modules).await });

        let mut context = RenderContext::new();
        context.request = Some(request);
        context.cur_route = Some(CurrentRoute {
            path: path.to_string(),
            options,
        });

        if let Err(err) = run_handlers(&routes, self.resolver.as_ref(), &mut context).await {
            trace_task.abort();
            return Err(RenderError::Handlers(err));
        }

        let component = match compose(&routes, self.resolver.as_ref(), &context).await {
            Ok(markup) => markup,
            Err(err) => {
                trace_task.abort();
                return Err(RenderError::Component(err));
            }
        };

        let css_trace = match trace_task.await {
            Ok(result) => result.map_err(RenderError::CssTrace)?,
            Err(err) => {
                return Err(RenderError::CssTrace(TraceError::TaskFailed(err.to_string())))
            }
        };

        Ok(Some(RenderObject {
            css_trace,
            component,
            context,
            routes,
        }))
    }

    /// Run the full pipeline and emit the final HTML page.
    ///
    /// `None` means no route matched.
    pub async fn render(
        &self,
        path: &str,
        request: RequestMeta,
    ) -> Result<Option<String>, RenderError> {
        let Some(mut render) = self.render_routes(path, request).await? else {
            return Ok(None);
        };
        let html = self
            .page
            .render_page(&mut render, self.resolver.as_ref())
            .await
            .map_err(RenderError::Page)?;
        Ok(Some(html))
    }
}
