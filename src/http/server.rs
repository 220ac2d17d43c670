//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the page handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch request paths to the render pipeline
//! - Map pipeline outcomes to HTTP responses
//!
//! # Design Decisions
//! - The engine owns no protocol details; this layer supplies the path and
//!   request metadata and consumes the markup string
//! - NoMatch → 404, pipeline failure → 500 with the error logged, never
//!   leaked into the response body

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::request::{request_id, request_meta, RequestIdLayer};
use crate::pipeline::RenderOrchestrator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RenderOrchestrator>,
}

/// HTTP server for the rendering engine.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server around a configured pipeline.
    pub fn new(config: ServerConfig, orchestrator: Arc<RenderOrchestrator>) -> Self {
        let state = AppState { orchestrator };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(page_handler))
            .route("/{*path}", get(page_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            env = ?self.config.env,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Main page handler: resolve, render, respond.
async fn page_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(&request).unwrap_or("unknown").to_string();
    let path = request.uri().path().to_string();
    let meta = request_meta(&request);

    tracing::debug!(request_id = %request_id, path = %path, "rendering page");

    match state.orchestrator.render(&path, meta).await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => {
            tracing::warn!(request_id = %request_id, path = %path, "no route matched");
            (StatusCode::NOT_FOUND, "No matching route found").into_response()
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, path = %path, error = %err, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error rendering page").into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
