//! Reference server: a small blog site rendered by the strata engine.
//!
//! Serves a built-in site by default; pass `--config` to load a site
//! definition from disk instead. The built-in registry is also what the
//! engine looks like from an embedding application: components and handlers
//! registered by the identifiers the route tree declares.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strata::config::SiteAssets;
use strata::render::RenderContext;
use strata::resolve::{FnComponent, Handler, HandlerError, ModuleRegistry};
use strata::routing::RouteTree;
use strata::trace::ManifestTracer;
use strata::{load_site, HttpServer, RenderOrchestrator, ServerConfig};

#[derive(Parser)]
#[command(name = "strata-demo")]
#[command(about = "Demo server for the strata rendering engine", long_about = None)]
struct Cli {
    /// Site configuration file (TOML). Defaults to the built-in demo site.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

/// Loads the post listing into the context.
struct BlogHandler;

#[async_trait]
impl Handler for BlogHandler {
    async fn handle(&self, ctx: &mut RenderContext) -> Result<(), HandlerError> {
        ctx.page_title = Some("Blog".to_string());
        ctx.insert(
            "posts",
            json!([
                { "id": "1", "title": "Hello, strata" },
                { "id": "2", "title": "Nested routes in practice" }
            ]),
        );
        Ok(())
    }
}

/// Picks the requested post out of the listing the blog handler loaded.
struct PostHandler;

#[async_trait]
impl Handler for PostHandler {
    async fn handle(&self, ctx: &mut RenderContext) -> Result<(), HandlerError> {
        let id = ctx
            .cur_route
            .as_ref()
            .and_then(|route| route.options.get("id").cloned())
            .ok_or_else(|| HandlerError::msg("post route matched without an id"))?;

        let post = ctx
            .get("posts")
            .and_then(|posts| posts.as_array())
            .and_then(|posts| posts.iter().find(|p| p["id"].as_str() == Some(id.as_str())))
            .cloned()
            .ok_or_else(|| HandlerError::msg(format!("no post with id {id}")))?;

        ctx.page_title = post["title"].as_str().map(String::from);
        ctx.insert("post", post);
        Ok(())
    }
}

fn demo_assets() -> SiteAssets {
    let tree = RouteTree::parse(&json!({
        "/": { "component": "layout" },
        "/blog": {
            "component": "blog",
            "serverHandler": "blog_handler",
            "/:id": {
                "component": "post",
                "serverHandler": "post_handler"
            }
        }
    }))
    .expect("built-in route tree is valid");

    SiteAssets {
        tree,
        bundles: None,
        modules: None,
        template: concat!(
            "<!doctype html><html><head><title>{{title}}</title>",
            "{{#each cssTrace}}<link rel=\"stylesheet\" href=\"{{this}}\">{{/each}}",
            "</head><body>{{{component}}}",
            "<script type=\"application/json\" id=\"context\">{{{context}}}</script>",
            "</body></html>"
        )
        .to_string(),
    }
}

fn demo_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_component(
        "layout",
        FnComponent(|_: &RenderContext, child: &str| format!("<main>{child}</main>")),
    );
    registry.register_component(
        "blog",
        FnComponent(|ctx: &RenderContext, child: &str| {
            if !child.is_empty() {
                return format!("<section class=\"blog\">{child}</section>");
            }
            let mut items = String::new();
            if let Some(posts) = ctx.get("posts").and_then(|p| p.as_array()) {
                for post in posts {
                    let id = post["id"].as_str().unwrap_or_default();
                    let title = post["title"].as_str().unwrap_or_default();
                    items.push_str(&format!("<li><a href=\"/blog/{id}\">{title}</a></li>"));
                }
            }
            format!("<section class=\"blog\"><ul>{items}</ul></section>")
        }),
    );
    registry.register_component(
        "post",
        FnComponent(|ctx: &RenderContext, _child: &str| {
            let title = ctx
                .get("post")
                .and_then(|post| post["title"].as_str())
                .unwrap_or("not found");
            format!("<article><h1>{title}</h1></article>")
        }),
    );
    registry.register_handler("blog_handler", BlogHandler);
    registry.register_handler("post_handler", PostHandler);
    registry
}

fn demo_tracer() -> ManifestTracer {
    ManifestTracer::from_deps([
        ("layout", vec!["layout.css"]),
        ("blog", vec!["layout.css", "blog.css"]),
        ("post", vec!["blog.css", "post.css"]),
        ("layout.css", vec![]),
        ("blog.css", vec![]),
        ("post.css", vec![]),
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strata=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let (mut config, assets) = match &cli.config {
        Some(path) => load_site(path)?,
        None => {
            tracing::info!("no config given; serving the built-in demo site");
            (ServerConfig::default(), demo_assets())
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    // A configured site can ship its own dependency manifest; the built-in
    // site falls back to the demo graph.
    let tracer = match assets.modules.clone() {
        Some(modules) => ManifestTracer::new(modules),
        None => demo_tracer(),
    };

    let orchestrator = Arc::new(RenderOrchestrator::new(
        &config,
        assets,
        Arc::new(demo_registry()),
        Arc::new(tracer),
    )?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "listening for connections"
    );

    let server = HttpServer::new(config, orchestrator);
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
