//! Per-request rendering context.
//!
//! # Design Decisions
//! - One context per request; never shared across requests
//! - Mutated only by the handler chain, read-only everywhere downstream
//! - Request metadata and template meta are stripped before the context is
//!   serialized into the page

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Inbound-request metadata exposed to handlers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestMeta {
    /// Request path, as received.
    pub path: String,

    /// Host header, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Request headers with UTF-8 values.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, Value>,
}

impl RequestMeta {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// The route the request resolved to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CurrentRoute {
    /// The requested path.
    pub path: String,

    /// Path parameters captured by the most specific match.
    pub options: HashMap<String, String>,
}

/// Mutable state shared across the handler chain and the template stage.
///
/// Handler side effects land in [`RenderContext::data`] and are flattened to
/// top-level keys on serialization, alongside the typed fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderContext {
    /// Inbound-request metadata. Removed at the serialization stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestMeta>,

    /// The matched route and its captured parameters.
    #[serde(rename = "curRoute", skip_serializing_if = "Option::is_none")]
    pub cur_route: Option<CurrentRoute>,

    /// Page title, set by handlers.
    #[serde(rename = "pageTitle", skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,

    /// SEO / template metadata. Removed at the serialization stage.
    #[serde(rename = "templateMeta", skip_serializing_if = "Option::is_none")]
    pub template_meta: Option<Value>,

    /// Handler-written page data.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handler side effect under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Read back a handler side effect.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_flattens_on_serialization() {
        let mut ctx = RenderContext::new();
        ctx.page_title = Some("Posts".to_string());
        ctx.insert("posts", json!(["a", "b"]));

        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["pageTitle"], json!("Posts"));
        assert_eq!(value["posts"], json!(["a", "b"]));
        // Unset optional fields leave no trace.
        assert!(value.get("request").is_none());
    }

    #[test]
    fn test_request_serializes_until_stripped() {
        let mut ctx = RenderContext::new();
        ctx.request = Some(RequestMeta::new("/blog"));

        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["request"]["path"], json!("/blog"));

        ctx.request = None;
        let value = serde_json::to_value(&ctx).unwrap();
        assert!(value.get("request").is_none());
    }
}
