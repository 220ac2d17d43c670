//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (bundle routes exist in the route tree)
//! - Validate value formats (bind address, base URL)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the loaded config and site files
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::bundles::BundleManifest;
use crate::config::schema::ServerConfig;
use crate::routing::tree::RouteTree;

/// One semantic configuration problem.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{address}': {reason}")]
    BindAddress { address: String, reason: String },

    #[error("invalid base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("route tree defines no routes")]
    EmptyRouteTree,

    #[error("bundle '{bundle}' references unknown route path '{path}'")]
    UnknownBundleRoute { bundle: String, path: String },
}

/// Validate the loaded configuration and site files together.
pub fn validate_site(
    config: &ServerConfig,
    tree: &RouteTree,
    bundles: Option<&BundleManifest>,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(err) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::BindAddress {
            address: config.listener.bind_address.clone(),
            reason: err.to_string(),
        });
    }

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if let Err(err) = Url::parse(&config.site.base_url) {
        errors.push(ValidationError::BaseUrl {
            url: config.site.base_url.clone(),
            reason: err.to_string(),
        });
    }

    if tree.is_empty() {
        errors.push(ValidationError::EmptyRouteTree);
    }

    // Every bundle route must name a pattern the tree can actually match.
    if let Some(manifest) = bundles {
        let known: Vec<String> = tree.pattern_paths();
        for (bundle, entry) in manifest.iter() {
            for path in &entry.routes {
                if !known.iter().any(|p| p == path) {
                    errors.push(ValidationError::UnknownBundleRoute {
                        bundle: bundle.to_string(),
                        path: path.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
