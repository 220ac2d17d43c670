//! Code-bundle visibility.
//!
//! # Responsibilities
//! - Hold the externally-supplied bundle manifest
//! - Decide which bundles serve the matched routes
//!
//! # Design Decisions
//! - Manifest iteration order is declaration order
//! - Visibility is a pure set intersection on route paths; it only drives
//!   preload references and never affects the render itself
//! - No manifest configured → the feature is disabled, not "empty"

use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::routing::tree::MatchedRoute;

/// One bundle's declaration: the route paths it serves.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BundleEntry {
    pub routes: Vec<String>,
}

/// External manifest mapping bundle name → served routes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleManifest {
    entries: Vec<(String, BundleEntry)>,
}

impl BundleManifest {
    /// Bundles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BundleEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for BundleManifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::deserialize(deserializer)?;
        let entries = map
            .into_iter()
            .map(|(name, value)| {
                let entry = serde_json::from_value(value).map_err(D::Error::custom)?;
                Ok((name, entry))
            })
            .collect::<Result<_, D::Error>>()?;
        Ok(Self { entries })
    }
}

impl Serialize for BundleManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

/// Bundles visible to the matched routes, as absolute references.
///
/// `None` when no manifest is configured. A bundle is visible when any
/// matched route's pattern path appears among its declared routes.
pub fn visible_bundles(
    routes: &[MatchedRoute],
    manifest: Option<&BundleManifest>,
) -> Option<Vec<String>> {
    let manifest = manifest?;
    let visible = manifest
        .iter()
        .filter(|(_, entry)| {
            routes
                .iter()
                .any(|route| entry.routes.iter().any(|path| *path == route.path))
        })
        .map(|(name, _)| format!("/{name}"))
        .collect();
    Some(visible)
}
