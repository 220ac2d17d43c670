//! Configuration loading from disk.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::bundles::BundleManifest;
use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_site, ValidationError};
use crate::routing::tree::{RouteTree, TreeError};
use crate::trace::ModuleInfo;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to parse {}: {source}", .path.display())]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid route tree: {0}")]
    Tree(#[from] TreeError),

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The site definition files the config references, loaded and parsed.
#[derive(Debug, Clone)]
pub struct SiteAssets {
    /// Parsed, immutable route tree.
    pub tree: RouteTree,

    /// Bundle manifest, when one is configured.
    pub bundles: Option<BundleManifest>,

    /// Module dependency manifest, when one is configured.
    pub modules: Option<HashMap<String, ModuleInfo>>,

    /// Raw page template source.
    pub template: String,
}

/// Load and validate the server configuration and the site files it names.
///
/// Relative site paths are resolved against the config file's directory.
pub fn load_site(config_path: &Path) -> Result<(ServerConfig, SiteAssets), ConfigError> {
    let config: ServerConfig = toml::from_str(&read(config_path)?)?;
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));

    let routes_path = resolve(base, &config.site.routes);
    let routes_value: serde_json::Value = serde_json::from_str(&read(&routes_path)?)
        .map_err(|source| ConfigError::ParseJson {
            path: routes_path.clone(),
            source,
        })?;
    let tree = RouteTree::parse(&routes_value)?;

    let bundles = match &config.site.bundles {
        Some(path) => {
            let bundles_path = resolve(base, path);
            let manifest = serde_json::from_str(&read(&bundles_path)?).map_err(|source| {
                ConfigError::ParseJson {
                    path: bundles_path,
                    source,
                }
            })?;
            Some(manifest)
        }
        None => None,
    };

    let modules = match &config.site.modules {
        Some(path) => {
            let modules_path = resolve(base, path);
            let manifest = serde_json::from_str(&read(&modules_path)?).map_err(|source| {
                ConfigError::ParseJson {
                    path: modules_path,
                    source,
                }
            })?;
            Some(manifest)
        }
        None => None,
    };

    let template = read(&resolve(base, &config.site.template))?;

    validate_site(&config, &tree, bundles.as_ref()).map_err(ConfigError::Validation)?;

    tracing::info!(
        config = %config_path.display(),
        routes = %routes_path.display(),
        bundles = config.site.bundles.is_some(),
        "site configuration loaded"
    );

    Ok((
        config,
        SiteAssets {
            tree,
            bundles,
            modules,
            template,
        },
    ))
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
