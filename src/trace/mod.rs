//! Style-sheet dependency tracing.
//!
//! # Data Flow
//! ```text
//! Matched component module ids
//!     → DependencyTracer::trace (one concurrent trace per module)
//!     → per-module style asset lists
//!     → trace_css merge (order-stable, first occurrence wins)
//! ```
//!
//! # Design Decisions
//! - The tracer is an injected capability; the engine never touches the
//!   underlying build tooling directly
//! - Each trace call owns its visited set; no state is shared across calls
//!   or requests
//! - Duplicate assets shared by several routes are emitted exactly once

use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::Deserialize;
use thiserror::Error;

/// Error raised while tracing a module's dependency graph.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A module referenced in the graph has no entry.
    #[error("unknown module '{0}' in dependency graph")]
    UnknownModule(String),

    /// A background trace task died before completing.
    #[error("trace task failed: {0}")]
    TaskFailed(String),
}

/// Computes a module's transitive style-asset dependencies.
#[async_trait]
pub trait DependencyTracer: Send + Sync {
    /// Style-asset paths the module transitively depends on, scheme-stripped,
    /// in deterministic discovery order.
    async fn trace(&self, module_id: &str) -> Result<Vec<String>, TraceError>;
}

/// Trace every module and merge the results.
///
/// Traces run concurrently. The merge preserves first-occurrence order with
/// respect to the input module order and drops exact duplicates, so a style
/// sheet shared by several routes appears once.
pub async fn trace_css(
    tracer: &dyn DependencyTracer,
    module_ids: &[String],
) -> Result<Vec<String>, TraceError> {
    let traces = try_join_all(module_ids.iter().map(|id| tracer.trace(id))).await?;

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for trace in traces {
        for path in trace {
            if seen.insert(path.clone()) {
                merged.push(path);
            }
        }
    }
    Ok(merged)
}

/// One module in a dependency manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleInfo {
    /// Resolved address, possibly scheme-prefixed (`file:/srv/app/x.css`).
    pub address: String,

    /// Modules this one depends on, in declaration order.
    #[serde(default)]
    pub deps: Vec<String>,
}

/// Tracer over a static dependency manifest.
///
/// Stands in for the build tool's loader state: the manifest records each
/// module's resolved address and direct dependencies, and tracing walks it
/// depth-first with a visited set scoped to the call.
#[derive(Debug, Clone, Default)]
pub struct ManifestTracer {
    modules: HashMap<String, ModuleInfo>,
}

impl ManifestTracer {
    pub fn new(modules: HashMap<String, ModuleInfo>) -> Self {
        Self { modules }
    }

    /// Convenience constructor: each module's address is its own id and its
    /// dependencies are given directly.
    pub fn from_deps<I, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, D)>,
        D: IntoIterator<Item = &'static str>,
    {
        let modules = entries
            .into_iter()
            .map(|(id, deps)| {
                let info = ModuleInfo {
                    address: id.to_string(),
                    deps: deps.into_iter().map(String::from).collect(),
                };
                (id.to_string(), info)
            })
            .collect();
        Self { modules }
    }

    fn walk(
        &self,
        id: &str,
        visited: &mut HashSet<String>,
        out: &mut Vec<String>,
    ) -> Result<(), TraceError> {
        if !visited.insert(id.to_string()) {
            return Ok(());
        }
        let info = self
            .modules
            .get(id)
            .ok_or_else(|| TraceError::UnknownModule(id.to_string()))?;

        if is_style_asset(&info.address) {
            out.push(strip_scheme(&info.address).to_string());
        }
        for dep in &info.deps {
            self.walk(dep, visited, out)?;
        }
        Ok(())
    }
}

#[async_trait]
impl DependencyTracer for ManifestTracer {
    async fn trace(&self, module_id: &str) -> Result<Vec<String>, TraceError> {
        // Fresh visited set per trace; nothing survives the call.
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        self.walk(module_id, &mut visited, &mut out)?;
        Ok(out)
    }
}

fn is_style_asset(address: &str) -> bool {
    strip_scheme(address).ends_with(".css")
}

/// Strip a leading scheme prefix (`file:`, `https:`) from an address.
fn strip_scheme(address: &str) -> &str {
    match address.split_once(':') {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')) =>
        {
            rest
        }
        _ => address,
    }
}
