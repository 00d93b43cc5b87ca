// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::watch::path_utils::relative_str;

/// Compiled ignore rules for a source tree.
///
/// Patterns are globs relative to the component root, with gitignore-like
/// conveniences:
///
/// - a pattern without `/` (e.g. `node_modules`, `*.swp`) matches at any depth;
/// - a leading `/` anchors the pattern at the root;
/// - a trailing `/` is dropped;
/// - a match on any ancestor directory ignores everything below it.
///
/// Blank lines and `#` comments are skipped. Negated (`!`) patterns are not
/// supported and are skipped as well.
#[derive(Clone)]
pub struct IgnoreMatcher {
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for IgnoreMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreMatcher")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl IgnoreMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for raw in patterns {
            let Some(pattern) = normalize_pattern(raw) else {
                continue;
            };
            let glob = GlobBuilder::new(&pattern).literal_separator(true).build()?;
            builder.add(glob);
        }

        Ok(Self {
            patterns: patterns.to_vec(),
            set: builder.build()?,
        })
    }

    /// A matcher that ignores nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    /// The patterns this matcher was built from, as given.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `rel_path` (relative to the root, `/`-separated) or
    /// any of its ancestors matches an ignore pattern.
    pub fn matches(&self, rel_path: &str) -> bool {
        if rel_path.is_empty() || self.set.is_empty() {
            return false;
        }

        let mut prefix_end = 0;
        for component in rel_path.split('/') {
            prefix_end += component.len();
            if !component.is_empty() && self.set.is_match(&rel_path[..prefix_end]) {
                return true;
            }
            prefix_end += 1;
        }
        false
    }

    /// Returns true if the absolute `path` under `root` is ignored.
    ///
    /// Paths that cannot be related to `root` are never ignored.
    pub fn is_ignored(&self, root: &Path, path: &Path) -> bool {
        match relative_str(root, path) {
            Some(rel) => self.matches(&rel),
            None => false,
        }
    }
}

fn normalize_pattern(raw: &str) -> Option<String> {
    let pattern = raw.trim();
    if pattern.is_empty() || pattern.starts_with('#') {
        return None;
    }
    if pattern.starts_with('!') {
        debug!(pattern, "negated ignore patterns are not supported; skipping");
        return None;
    }

    let pattern = pattern.trim_end_matches('/');
    if let Some(anchored) = pattern.strip_prefix('/') {
        return Some(anchored.to_string());
    }
    if pattern.contains('/') {
        Some(pattern.to_string())
    } else {
        Some(format!("**/{pattern}"))
    }
}
