//! Recursive route resolution.
//!
//! # Responsibilities
//! - Resolve a request path against the route tree
//! - Build the matched chain, most general to most specific
//! - Lift the terminal match's captured parameters to the result
//!
//! # Design Decisions
//! - Depth-first search; unmatched prefixes prune the whole subtree
//! - Children visited in declaration order; the last matching sibling wins
//! - Pure and synchronous; no I/O, deterministic for a given tree and path

use std::collections::HashMap;

use crate::routing::pattern::Pattern;
use crate::routing::tree::{display_path, MatchResult, MatchedRoute, RouteNode, RouteTree};

/// Resolve `path` against the tree.
///
/// Returns the matched chain ordered root to leaf, with the leaf's captured
/// path parameters lifted into [`MatchResult::options`], or `None` when no
/// terminal node matches.
pub fn match_path(path: &str, tree: &RouteTree) -> Option<MatchResult> {
    if tree.is_empty() {
        return None;
    }

    let mut chain = match_node(path, "", tree.root())?;

    // The chain grew leaf to root while recursion unwound.
    chain.reverse();

    let options = chain
        .last_mut()
        .and_then(|leaf| leaf.options.take())
        .unwrap_or_else(HashMap::new);

    Some(MatchResult {
        options,
        routes: chain,
    })
}

/// Match below one node, `prefix` being the pattern accumulated so far.
///
/// Returns the chain leaf-first: the terminal entry at index 0, ancestors
/// appended as the recursion unwinds.
fn match_node(path: &str, prefix: &str, node: &RouteNode) -> Option<Vec<MatchedRoute>> {
    let pattern = Pattern::new(&display_path(prefix));

    // Terminal match: the accumulated pattern covers the whole path.
    if let Some(options) = pattern.match_full(path) {
        let mut route = node.to_route(prefix);
        route.options = Some(options);
        return Some(vec![route]);
    }

    // Prune: nothing below this node can match a path it does not prefix.
    if !pattern.match_prefix(path) {
        return None;
    }

    let mut matched: Option<Vec<MatchedRoute>> = None;
    for (key, child) in node.children() {
        let child_prefix = format!("{prefix}{key}");
        if let Some(mut chain) = match_node(path, &child_prefix, child) {
            if matched.is_some() {
                tracing::debug!(
                    path,
                    winner = %child_prefix,
                    "sibling routes both match; later declaration takes precedence"
                );
            }
            chain.push(node.to_route(prefix));
            matched = Some(chain);
        }
    }
    matched
}
