//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID as early as possible, for tracing
//! - Extract routing-relevant information (host, path, headers) into the
//!   request metadata handlers see
//!
//! # Design Decisions
//! - Inbound request IDs are honored; one is generated only when absent
//! - Only UTF-8 header values are exposed to handlers

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use serde_json::Value;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::render::context::RequestMeta;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Ensures every request carries an `x-request-id` header.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service half of [`RequestIdLayer`].
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if !req.headers().contains_key(X_REQUEST_ID) {
            let id = Uuid::new_v4().to_string();
            // A UUID is always a valid header value.
            let value = HeaderValue::from_str(&id).unwrap();
            req.headers_mut().insert(X_REQUEST_ID, value);
        }
        self.inner.call(req)
    }
}

/// The request ID, if one is present.
pub fn request_id<B>(req: &Request<B>) -> Option<&str> {
    req.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Build the request metadata handlers see from the inbound request.
pub fn request_meta(req: &Request<Body>) -> RequestMeta {
    let mut meta = RequestMeta::new(req.uri().path());
    meta.host = req
        .headers()
        .get("host")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            meta.headers
                .insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }
    meta
}
