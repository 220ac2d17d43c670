//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile route pattern strings into segment lists
//! - Exact match with named-parameter capture
//! - Prefix match (pattern plus an implicit wildcard suffix)
//!
//! # Design Decisions
//! - Named segments (`:name`) bind exactly one path segment
//! - A trailing `*` segment matches any remainder
//! - No regex to guarantee O(n) matching
//! - Patterns are case-sensitive

use std::collections::HashMap;

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// Binds the path segment under the given name.
    Param(String),
    /// Matches the entire remaining path.
    Wildcard,
}

/// A compiled path pattern.
///
/// The empty pattern and `/` both compile to zero segments and match only
/// the root path exactly, while prefix-matching every path.
#[derive(Debug, Clone)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern string.
    pub fn new(source: &str) -> Self {
        let segments = split(source)
            .map(|seg| {
                if seg == "*" {
                    Segment::Wildcard
                } else if let Some(name) = seg.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Match the full path against this pattern.
    ///
    /// Returns the captured named parameters on success, `None` otherwise.
    pub fn match_full(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut path_segments = split(path);

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => {
                    // Consumes the rest of the path, however deep.
                    debug_assert_eq!(i, self.segments.len() - 1);
                    return Some(params);
                }
                Segment::Param(name) => {
                    let value = path_segments.next()?;
                    params.insert(name.clone(), value.to_string());
                }
                Segment::Literal(expected) => {
                    if path_segments.next()? != expected {
                        return None;
                    }
                }
            }
        }

        // Path must be fully consumed for an exact match.
        if path_segments.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Test whether the path begins with this pattern.
    ///
    /// Equivalent to matching the pattern with a wildcard suffix appended;
    /// the remainder of the path is left unexamined.
    pub fn match_prefix(&self, path: &str) -> bool {
        let mut path_segments = split(path);

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return true,
                Segment::Param(_) => {
                    if path_segments.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(expected) => {
                    if path_segments.next() != Some(expected.as_str()) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Split a path or pattern into its non-empty segments.
///
/// Leading, trailing and doubled slashes produce no segments, so `/blog`
/// and `/blog/` compare equal.
fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
