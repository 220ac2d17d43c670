//! Final page emission.
//!
//! # Responsibilities
//! - Strip and serialize the render context for the client
//! - Normalize the css trace so the client can fetch the assets
//! - Render the configured Handlebars template with the full descriptor
//!
//! # Design Decisions
//! - Template compiled once at startup; rendering is per-request
//! - Bundle references are injected only in production with a manifest
//!   configured, so development always loads modules individually
//! - Serialize hooks run after the built-in strip, in chain order

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::bundles::{visible_bundles, BundleManifest};
use crate::config::schema::ServerConfig;
use crate::render::chain::{route_handler, ChainError};
use crate::render::context::RenderContext;
use crate::render::RenderObject;
use crate::resolve::ModuleResolver;
use crate::routing::tree::{MatchedRoute, RouteTree};

/// Error raised while emitting the final page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid page template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("template render failed: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("context serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Everything the template sees. Field names are the template's vocabulary.
#[derive(Debug, Serialize)]
struct TemplateData<'a> {
    #[serde(rename = "cssTrace")]
    css_trace: Vec<String>,

    /// Full bundle manifest as a JSON string, production only.
    #[serde(skip_serializing_if = "Option::is_none")]
    bundles: Option<&'a str>,

    /// Bundle references visible to the matched routes, production only.
    #[serde(rename = "visibleBundles", skip_serializing_if = "Option::is_none")]
    visible_bundles: Option<Vec<String>>,

    /// The composed component markup.
    component: &'a str,

    /// Full route tree as a JSON string, for client-side resolution.
    routes: &'a str,

    /// The matched chain as a JSON string.
    #[serde(rename = "matchedRoutes")]
    matched_routes: String,

    /// The serialized render context as a JSON string.
    context: String,

    path: String,
    title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Value>,

    #[serde(rename = "baseURL")]
    base_url: &'a str,

    #[serde(rename = "addLinkHandlers")]
    add_link_handlers: bool,
}

/// Renders the final HTML page from a finished [`RenderObject`].
#[derive(Debug)]
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
    routes_json: String,
    bundles: Option<BundleManifest>,
    bundles_json: Option<String>,
    base_url: String,
    asset_root: String,
    production: bool,
    add_link_handlers: bool,
}

impl PageRenderer {
    pub fn new(
        config: &ServerConfig,
        template: &str,
        tree: &RouteTree,
        bundles: Option<BundleManifest>,
    ) -> Result<Self, PageError> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string("page", template)
            .map_err(Box::new)?;

        let routes_json = serde_json::to_string(tree.raw())?;
        let bundles_json = bundles
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            handlebars,
            routes_json,
            bundles,
            bundles_json,
            base_url: config.site.base_url.clone(),
            asset_root: config.site.asset_root.clone(),
            production: config.env.is_production(),
            add_link_handlers: config.site.anchors,
        })
    }

    /// Serialize the context and render the page template.
    pub async fn render_page(
        &self,
        render: &mut RenderObject,
        resolver: &dyn ModuleResolver,
    ) -> Result<String, PageError> {
        // Template meta feeds the template but never reaches the client
        // context, so it is lifted out before the strip.
        let meta = render.context.template_meta.take();

        serialize_context(&render.routes, resolver, &mut render.context).await?;

        let include_bundles = self.production && self.bundles.is_some();
        let visible = visible_bundles(&render.routes, self.bundles.as_ref());

        let data = TemplateData {
            css_trace: normalize_css_trace(&render.css_trace, &self.asset_root),
            bundles: if include_bundles {
                self.bundles_json.as_deref()
            } else {
                None
            },
            visible_bundles: if include_bundles { visible } else { None },
            component: &render.component,
            routes: &self.routes_json,
            matched_routes: serde_json::to_string(&render.routes)?,
            context: serde_json::to_string(&render.context)?,
            path: render
                .context
                .cur_route
                .as_ref()
                .map(|route| route.path.clone())
                .unwrap_or_default(),
            title: render.context.page_title.clone().unwrap_or_default(),
            meta,
            base_url: &self.base_url,
            add_link_handlers: self.add_link_handlers,
        };

        Ok(self.handlebars.render("page", &data)?)
    }
}

/// Strip server-only state from the context and apply handler serialize
/// hooks, in chain order.
pub async fn serialize_context(
    chain: &[MatchedRoute],
    resolver: &dyn ModuleResolver,
    ctx: &mut RenderContext,
) -> Result<(), ChainError> {
    ctx.request = None;
    ctx.template_meta = None;

    for route in chain {
        if let Some(handler) = route_handler(route, resolver).await? {
            handler.serialize(ctx);
        }
    }
    Ok(())
}

/// Rebase traced asset paths from the filesystem onto the web root.
fn normalize_css_trace(trace: &[String], asset_root: &str) -> Vec<String> {
    trace
        .iter()
        .map(|path| {
            path.strip_prefix(asset_root)
                .unwrap_or(path.as_str())
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Environment;
    use crate::render::context::RequestMeta;
    use crate::resolve::{Handler, HandlerError, ModuleRegistry};
    use async_trait::async_trait;
    use serde_json::json;

    struct StampHandler;

    #[async_trait]
    impl Handler for StampHandler {
        async fn handle(&self, ctx: &mut RenderContext) -> Result<(), HandlerError> {
            ctx.insert("secret", json!("s3cret"));
            ctx.insert("public", json!("hello"));
            Ok(())
        }

        fn serialize(&self, ctx: &mut RenderContext) {
            ctx.data.remove("secret");
        }
    }

    fn route(path: &str, handler: Option<&str>) -> MatchedRoute {
        MatchedRoute {
            path: path.to_string(),
            component: None,
            handler: handler.map(String::from),
            server_handler: None,
            options: None,
            extra: serde_json::Map::new(),
        }
    }

    fn config(env: Environment) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.env = env;
        config.site.base_url = "http://localhost:8080".to_string();
        config.site.asset_root = "/srv/site".to_string();
        config
    }

    fn tree() -> RouteTree {
        RouteTree::parse(&json!({ "/": { "component": "home" } })).unwrap()
    }

    #[tokio::test]
    async fn test_serialize_strips_request_and_meta_and_runs_hooks() {
        let mut registry = ModuleRegistry::new();
        registry.register_handler("h", StampHandler);

        let chain = vec![route("/", Some("h"))];
        let mut ctx = RenderContext::new();
        ctx.request = Some(RequestMeta::new("/"));
        ctx.template_meta = Some(json!({ "description": "d" }));
        StampHandler.handle(&mut ctx).await.unwrap();

        serialize_context(&chain, &registry, &mut ctx).await.unwrap();
        assert!(ctx.request.is_none());
        assert!(ctx.template_meta.is_none());
        assert!(ctx.get("secret").is_none());
        assert_eq!(ctx.get("public"), Some(&json!("hello")));
    }

    #[tokio::test]
    async fn test_render_page_emits_descriptor_fields() {
        let registry = ModuleRegistry::new();
        let renderer = PageRenderer::new(
            &config(Environment::Development),
            "<title>{{title}}</title>{{#each cssTrace}}<link href=\"{{this}}\">{{/each}}{{{component}}}",
            &tree(),
            None,
        )
        .unwrap();

        let mut render = RenderObject {
            css_trace: vec!["/srv/site/app.css".to_string()],
            component: "<main>hi</main>".to_string(),
            context: {
                let mut ctx = RenderContext::new();
                ctx.page_title = Some("Home".to_string());
                ctx
            },
            routes: vec![route("/", None)],
        };

        let html = renderer.render_page(&mut render, &registry).await.unwrap();
        assert_eq!(html, "<title>Home</title><link href=\"/app.css\"><main>hi</main>");
    }

    #[tokio::test]
    async fn test_bundles_only_injected_in_production() {
        let registry = ModuleRegistry::new();
        let manifest: BundleManifest =
            serde_json::from_value(json!({ "home": { "routes": ["/"] } })).unwrap();
        let template = "{{#if visibleBundles}}{{#each visibleBundles}}{{this}}{{/each}}{{else}}none{{/if}}";

        for (env, expected) in [
            (Environment::Production, "/home"),
            (Environment::Development, "none"),
        ] {
            let renderer =
                PageRenderer::new(&config(env), template, &tree(), Some(manifest.clone()))
                    .unwrap();
            let mut render = RenderObject {
                css_trace: vec![],
                component: String::new(),
                context: RenderContext::new(),
                routes: vec![route("/", None)],
            };
            let html = renderer.render_page(&mut render, &registry).await.unwrap();
            assert_eq!(html, expected);
        }
    }

    #[test]
    fn test_invalid_template_rejected_at_construction() {
        let err = PageRenderer::new(
            &config(Environment::Development),
            "{{#each}}",
            &tree(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PageError::Template(_)));
    }
}
