//! End-to-end tests for the render pipeline, in process and over HTTP.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use strata::config::Environment;
use strata::{HttpServer, RequestMeta, ServerConfig};

mod common;

#[tokio::test]
async fn test_nested_blog_post_render() {
    let orch = common::orchestrator();
    let render = orch
        .render_routes("/blog/42", RequestMeta::new("/blog/42"))
        .await
        .unwrap()
        .expect("route should match");

    // Chain ordered general → specific.
    let paths: Vec<&str> = render.routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/", "/blog", "/blog/:id"]);

    // Nesting mirrors the chain: layout wraps blog wraps post.
    assert_eq!(
        render.component,
        "<main><section><article>answer</article></section></main>"
    );

    // Shared style sheets deduplicated, first occurrence wins.
    assert_eq!(
        render.css_trace,
        vec!["layout.css", "blog.css", "post.css"]
    );

    // Handler chain ran root → leaf: the leaf saw the listing and the title
    // reflects the selected post.
    assert_eq!(render.context.page_title.as_deref(), Some("answer"));
}

#[tokio::test]
async fn test_page_over_http() {
    let config = ServerConfig::default();
    let server = HttpServer::new(config.clone(), common::orchestrator_with(common::registry(), &config));

    let response = server
        .router()
        .oneshot(Request::get("/blog/1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();

    assert!(html.contains("<title>first</title>"));
    assert!(html.contains("<article>first</article>"));
    assert!(html.contains("<link href=\"layout.css\">"));
}

#[tokio::test]
async fn test_serialized_context_is_stripped() {
    let config = ServerConfig::default();
    let server = HttpServer::new(config.clone(), common::orchestrator_with(common::registry(), &config));

    let response = server
        .router()
        .oneshot(Request::get("/blog/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();

    let context_json = html
        .split("<script id=\"context\">")
        .nth(1)
        .and_then(|rest| rest.split("</script>").next())
        .expect("page embeds the context");
    let context: Value = serde_json::from_str(context_json).unwrap();

    // Request metadata, template meta and serialize-stripped keys are gone;
    // handler data and the current route survive.
    assert!(context.get("request").is_none());
    assert!(context.get("templateMeta").is_none());
    assert!(context.get("dbHandle").is_none());
    assert_eq!(context["curRoute"]["options"]["id"], Value::String("1".into()));
    assert!(context.get("posts").is_some());
}

#[tokio::test]
async fn test_bundles_visible_in_production_only() {
    for (env, expected) in [(Environment::Production, true), (Environment::Development, false)] {
        let mut config = ServerConfig::default();
        config.env = env;
        let server =
            HttpServer::new(config.clone(), common::orchestrator_with(common::registry(), &config));

        let response = server
            .router()
            .oneshot(Request::get("/blog/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();

        assert_eq!(html.contains("<script src=\"/blog-bundle\"></script>"), expected);
    }
}

#[tokio::test]
async fn test_unmatched_path_is_404() {
    let config = ServerConfig::default();
    let server = HttpServer::new(config.clone(), common::orchestrator_with(common::registry(), &config));

    let response = server
        .router()
        .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_handler_failure_is_500() {
    let mut registry = common::registry();
    registry.register_handler("blog_handler", common::BrokenHandler);

    let config = ServerConfig::default();
    let server = HttpServer::new(config.clone(), common::orchestrator_with(registry, &config));

    let response = server
        .router()
        .oneshot(Request::get("/blog/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The failure never leaks internals into the body.
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("backend unavailable"));
}

#[tokio::test]
async fn test_request_id_assigned() {
    let config = ServerConfig::default();
    let server = HttpServer::new(config.clone(), common::orchestrator_with(common::registry(), &config));

    // The request-id layer runs on the way in; handlers observe it via the
    // request metadata, and a supplied id is honored end to end.
    let orch = common::orchestrator();
    let mut meta = RequestMeta::new("/blog/1");
    meta.headers.insert(
        "x-request-id".to_string(),
        Value::String("req-123".to_string()),
    );
    let render = orch
        .render_routes("/blog/1", meta)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        render.context.request.as_ref().unwrap().headers["x-request-id"],
        Value::String("req-123".to_string())
    );

    let response = server
        .router()
        .oneshot(Request::get("/blog/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
