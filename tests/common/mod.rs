//! Shared fixtures for integration testing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use strata::config::SiteAssets;
use strata::render::RenderContext;
use strata::resolve::{FnComponent, Handler, HandlerError, ModuleRegistry};
use strata::routing::RouteTree;
use strata::trace::ManifestTracer;
use strata::{RenderOrchestrator, ServerConfig};

/// Writes the post listing into the context and remembers a server secret
/// that must never reach the serialized page.
pub struct BlogHandler;

#[async_trait]
impl Handler for BlogHandler {
    async fn handle(&self, ctx: &mut RenderContext) -> Result<(), HandlerError> {
        ctx.page_title = Some("Blog".to_string());
        ctx.template_meta = Some(json!({ "description": "a demo blog" }));
        ctx.insert("dbHandle", json!("postgres://internal"));
        ctx.insert(
            "posts",
            json!([
                { "id": "1", "title": "first" },
                { "id": "42", "title": "answer" }
            ]),
        );
        Ok(())
    }

    fn serialize(&self, ctx: &mut RenderContext) {
        ctx.data.remove("dbHandle");
    }
}

/// Resolves the requested post from the listing.
pub struct PostHandler;

#[async_trait]
impl Handler for PostHandler {
    async fn handle(&self, ctx: &mut RenderContext) -> Result<(), HandlerError> {
        let id = ctx
            .cur_route
            .as_ref()
            .and_then(|route| route.options.get("id").cloned())
            .ok_or_else(|| HandlerError::msg("missing id"))?;
        let post = ctx
            .get("posts")
            .and_then(|posts| posts.as_array())
            .and_then(|posts| posts.iter().find(|p| p["id"].as_str() == Some(id.as_str())))
            .cloned()
            .ok_or_else(|| HandlerError::msg(format!("no post {id}")))?;
        ctx.page_title = post["title"].as_str().map(String::from);
        ctx.insert("post", post);
        Ok(())
    }
}

/// A handler that always fails, for error-path tests.
pub struct BrokenHandler;

#[async_trait]
impl Handler for BrokenHandler {
    async fn handle(&self, _ctx: &mut RenderContext) -> Result<(), HandlerError> {
        Err(HandlerError::msg("backend unavailable"))
    }
}

pub fn site_assets() -> SiteAssets {
    let tree = RouteTree::parse(&json!({
        "/": { "component": "layout" },
        "/blog": {
            "component": "blog",
            "serverHandler": "blog_handler",
            "/:id": { "component": "post", "serverHandler": "post_handler" }
        }
    }))
    .unwrap();

    SiteAssets {
        tree,
        bundles: Some(
            serde_json::from_value(json!({
                "blog-bundle": { "routes": ["/blog", "/blog/:id"] }
            }))
            .unwrap(),
        ),
        modules: None,
        template: concat!(
            "<title>{{title}}</title>",
            "{{#each cssTrace}}<link href=\"{{this}}\">{{/each}}",
            "{{{component}}}",
            "<script id=\"context\">{{{context}}}</script>",
            "{{#each visibleBundles}}<script src=\"{{this}}\"></script>{{/each}}"
        )
        .to_string(),
    }
}

pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_component(
        "layout",
        FnComponent(|_: &RenderContext, child: &str| format!("<main>{child}</main>")),
    );
    registry.register_component(
        "blog",
        FnComponent(|_: &RenderContext, child: &str| format!("<section>{child}</section>")),
    );
    registry.register_component(
        "post",
        FnComponent(|ctx: &RenderContext, _child: &str| {
            let title = ctx
                .get("post")
                .and_then(|post| post["title"].as_str())
                .unwrap_or("missing");
            format!("<article>{title}</article>")
        }),
    );
    registry.register_handler("blog_handler", BlogHandler);
    registry.register_handler("post_handler", PostHandler);
    registry
}

pub fn tracer() -> ManifestTracer {
    ManifestTracer::from_deps([
        ("layout", vec!["layout.css"]),
        ("blog", vec!["layout.css", "blog.css"]),
        ("post", vec!["blog.css", "post.css"]),
        ("layout.css", vec![]),
        ("blog.css", vec![]),
        ("post.css", vec![]),
    ])
}

pub fn orchestrator_with(registry: ModuleRegistry, config: &ServerConfig) -> Arc<RenderOrchestrator> {
    Arc::new(
        RenderOrchestrator::new(config, site_assets(), Arc::new(registry), Arc::new(tracer()))
            .unwrap(),
    )
}

#[allow(dead_code)]
pub fn orchestrator() -> Arc<RenderOrchestrator> {
    orchestrator_with(registry(), &ServerConfig::default())
}
