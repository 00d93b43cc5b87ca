// src/watch/debatcher.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::events::{FileEvent, FileOp};
use crate::watch::patterns::IgnoreMatcher;

/// Outcome of evaluating one batch of raw events.
///
/// `changed` and `deleted` feed the pending change set; `rewatch` and
/// `unwatch` tell the detector how its watch set must follow the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChanges {
    pub changed: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// Directories created or modified that must be (re)watched.
    pub rewatch: Vec<PathBuf>,
    /// Paths removed or renamed away; their watches must be dropped.
    pub unwatch: Vec<PathBuf>,
}

impl FileChanges {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// Split a batch of events into deduplicated changed and deleted paths.
///
/// - ignored paths are dropped, even though they are never watched: deleting
///   an ignored directory still raises one event on its watched parent;
/// - a `Remove`/`Rename` marks the path deleted, unless the same batch
///   already reported it as changed (it then stays in `changed` only);
/// - other ops are stat'ed first: a path that is already gone (editor temp
///   files) is dropped, and so is a `Write` on a directory, which some
///   platforms emit next to the `Create` of a child.
///
/// Stateless: accumulation across calls is the caller's job.
pub fn evaluate_file_changes(
    fs: &dyn FileSystem,
    root: &Path,
    events: &[FileEvent],
    ignores: &IgnoreMatcher,
) -> FileChanges {
    let mut out = FileChanges::default();
    let mut seen_changed: HashSet<&Path> = HashSet::new();
    let mut seen_deleted: HashSet<&Path> = HashSet::new();
    let mut seen_unwatch: HashSet<&Path> = HashSet::new();

    for event in events {
        debug!(path = ?event.path, op = ?event.op, "filesystem watch event");
        let path = event.path.as_path();

        if path.as_os_str().is_empty() {
            continue;
        }
        if ignores.is_ignored(root, path) {
            continue;
        }

        if event.op.is_removal() {
            if seen_unwatch.insert(path) {
                out.unwatch.push(path.to_path_buf());
            }
            if !seen_changed.contains(path) && seen_deleted.insert(path) {
                out.deleted.push(path.to_path_buf());
            }
            continue;
        }

        let kind = match fs.stat(path) {
            Ok(kind) => kind,
            Err(err) => {
                debug!(path = ?path, error = %err, "ignoring event for file that no longer exists");
                continue;
            }
        };
        if kind.is_dir() && event.op == FileOp::Write {
            continue;
        }

        if seen_changed.insert(path) {
            out.changed.push(path.to_path_buf());
            if kind.is_dir() {
                out.rewatch.push(path.to_path_buf());
            }
        }
    }

    out
}
