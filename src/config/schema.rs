//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the rendering server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Site definition: route tree, template, bundles, client-facing URLs.
    pub site: SiteConfig,

    /// Deployment environment. Bundle injection is production-only.
    pub env: Environment,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout applied by the HTTP layer.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Site definition files and client-facing settings.
///
/// Relative paths are resolved against the directory of the config file that
/// named them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Route tree definition (JSON).
    pub routes: PathBuf,

    /// Page template (Handlebars).
    pub template: PathBuf,

    /// Optional bundle manifest (JSON). Absent → bundle injection disabled.
    pub bundles: Option<PathBuf>,

    /// Optional module dependency manifest (JSON), for style tracing.
    pub modules: Option<PathBuf>,

    /// Base URL handed to the template for client-side resolution.
    pub base_url: String,

    /// Filesystem prefix stripped from traced style paths so the client can
    /// fetch them relative to the web root.
    pub asset_root: String,

    /// Whether the client should intercept anchor navigation
    /// (`addLinkHandlers` in the template).
    pub anchors: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            routes: PathBuf::from("routes.json"),
            template: PathBuf::from("template.hbs"),
            bundles: None,
            modules: None,
            base_url: "http://localhost:8080".to_string(),
            asset_root: String::new(),
            anchors: true,
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}
