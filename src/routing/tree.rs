//! Route tree representation.
//!
//! # Data Flow
//! ```text
//! routes.json
//!     → serde_json::Value (declaration order preserved)
//!     → RouteTree::parse (typed nodes, module refs extracted)
//!     → immutable RouteTree shared via Arc
//! ```
//!
//! # Design Decisions
//! - Keys beginning with `/` are child branches; everything else is metadata
//! - The `/` key holds a node's own-segment terminal metadata
//! - Child declaration order is preserved; it is definitional for matching
//! - The tree is immutable once parsed

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error raised while parsing a route definition tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A route key did not hold a JSON object.
    #[error("route '{0}' is not an object")]
    NotAnObject(String),

    /// A module reference field held something other than a string.
    #[error("route '{at}': field '{field}' must be a module identifier string")]
    ModuleRefNotString { at: String, field: String },

    /// A node's own-segment target (`/` key) contained child branches.
    #[error("route '{0}': the '/' target cannot contain child routes")]
    BranchBelowSelfTarget(String),
}

/// An immutable, author-defined tree of nested route definitions.
#[derive(Debug, Clone)]
pub struct RouteTree {
    root: RouteNode,
    raw: Value,
}

impl RouteTree {
    /// Parse a route tree from its JSON definition.
    pub fn parse(value: &Value) -> Result<Self, TreeError> {
        let map = value
            .as_object()
            .ok_or_else(|| TreeError::NotAnObject("/".to_string()))?;
        let root = RouteNode::parse(map, "/")?;
        Ok(Self {
            root,
            raw: value.clone(),
        })
    }

    /// The root node.
    pub fn root(&self) -> &RouteNode {
        &self.root
    }

    /// The raw JSON definition, as authored.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// True when the tree defines nothing at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Every pattern path reachable in the tree, root first.
    ///
    /// Used to validate external references to route paths, e.g. from the
    /// bundle manifest.
    pub fn pattern_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_paths(&self.root, "", &mut paths);
        paths
    }
}

fn collect_paths(node: &RouteNode, prefix: &str, out: &mut Vec<String>) {
    out.push(display_path(prefix));
    for (key, child) in node.children() {
        let child_prefix = format!("{prefix}{key}");
        collect_paths(child, &child_prefix, out);
    }
}

/// The pattern a node matches under, as recorded in `_path`.
///
/// The root accumulates no prefix and defaults to `/`.
pub fn display_path(prefix: &str) -> String {
    if prefix.is_empty() {
        "/".to_string()
    } else {
        prefix.to_string()
    }
}

/// One node of the route tree: per-route metadata plus ordered child branches.
#[derive(Debug, Clone, Default)]
pub struct RouteNode {
    component: Option<String>,
    handler: Option<String>,
    server_handler: Option<String>,
    extra: Map<String, Value>,
    children: Vec<(String, RouteNode)>,
}

impl RouteNode {
    fn parse(map: &Map<String, Value>, at: &str) -> Result<Self, TreeError> {
        let mut node = RouteNode::default();
        for (key, value) in map {
            if key == "/" {
                // Own-segment terminal target: its metadata belongs to this
                // node, and it cannot branch further.
                let target = value
                    .as_object()
                    .ok_or_else(|| TreeError::NotAnObject(at.to_string()))?;
                for (meta_key, meta_value) in target {
                    if meta_key.starts_with('/') {
                        return Err(TreeError::BranchBelowSelfTarget(at.to_string()));
                    }
                    node.set_meta(meta_key, meta_value, at)?;
                }
            } else if key.starts_with('/') {
                let child_at = join_path(at, key);
                let child = value
                    .as_object()
                    .ok_or_else(|| TreeError::NotAnObject(child_at.clone()))?;
                node.children
                    .push((key.clone(), RouteNode::parse(child, &child_at)?));
            } else {
                node.set_meta(key, value, at)?;
            }
        }
        Ok(node)
    }

    fn set_meta(&mut self, key: &str, value: &Value, at: &str) -> Result<(), TreeError> {
        let module_ref = |value: &Value| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| TreeError::ModuleRefNotString {
                    at: at.to_string(),
                    field: key.to_string(),
                })
        };
        match key {
            "component" => self.component = Some(module_ref(value)?),
            "handler" => self.handler = Some(module_ref(value)?),
            "serverHandler" => self.server_handler = Some(module_ref(value)?),
            _ => {
                self.extra.insert(key.to_string(), value.clone());
            }
        }
        Ok(())
    }

    /// Child branches in declaration order.
    pub fn children(&self) -> &[(String, RouteNode)] {
        &self.children
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// True when the node carries no metadata and no branches.
    pub fn is_empty(&self) -> bool {
        self.component.is_none()
            && self.handler.is_none()
            && self.server_handler.is_none()
            && self.extra.is_empty()
            && self.children.is_empty()
    }

    /// Materialize this node's metadata as a matched-route entry.
    pub fn to_route(&self, prefix: &str) -> MatchedRoute {
        MatchedRoute {
            path: display_path(prefix),
            component: self.component.clone(),
            handler: self.handler.clone(),
            server_handler: self.server_handler.clone(),
            options: None,
            extra: self.extra.clone(),
        }
    }
}

fn join_path(at: &str, key: &str) -> String {
    if at == "/" {
        key.to_string()
    } else {
        format!("{at}{key}")
    }
}

/// One entry in a matched-route chain.
///
/// Serializes in the authored shape: the pattern under `_path`, module
/// references under their route-definition names, extras flattened through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRoute {
    /// The pattern this entry matched under.
    #[serde(rename = "_path")]
    pub path: String,

    /// Component module identifier, if the route declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Shared handler module identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,

    /// Server-only handler module identifier; takes precedence over `handler`.
    #[serde(rename = "serverHandler", skip_serializing_if = "Option::is_none")]
    pub server_handler: Option<String>,

    /// Captured path parameters. Present only transiently on the terminal
    /// entry; lifted into [`MatchResult::options`] before the chain is
    /// returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<HashMap<String, String>>,

    /// Arbitrary per-route metadata, passed through to rendering.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A successful route resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Path parameters captured by the most specific match.
    pub options: HashMap<String, String>,

    /// Matched chain, most general first, most specific last.
    pub routes: Vec<MatchedRoute>,
}
