// src/watch/detector.rs

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::errors::WatchError;
use crate::watch::events::{from_notify, FileEvent};
use crate::watch::patterns::IgnoreMatcher;

/// Receiving ends of a [`SourceWatcher`].
///
/// `events` carries every change observed under the watched tree; `errors`
/// carries internal watcher failures, which are fatal for a session.
#[derive(Debug)]
pub struct SourceStreams {
    pub events: mpsc::UnboundedReceiver<FileEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// Filesystem change detector.
///
/// Every directory of the source tree gets its own non-recursive watch so
/// that ignored directories (`.git`, `node_modules`, ...) never consume
/// watch descriptors. The watch set is kept up to date by the caller through
/// [`SourceWatcher::add_recursive_watch`] and [`SourceWatcher::remove_watch`]
/// as directories come and go.
///
/// Dropping the watcher stops all watches and closes the streams.
pub struct SourceWatcher {
    root: PathBuf,
    ignores: IgnoreMatcher,
    watcher: RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
}

impl std::fmt::Debug for SourceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceWatcher")
            .field("root", &self.root)
            .field("watched", &self.watched.len())
            .finish_non_exhaustive()
    }
}

impl SourceWatcher {
    /// Create a detector and seed it with the whole tree under `root`.
    ///
    /// A `root` that does not exist is not an error: nothing is watched.
    /// Failing to walk the tree is returned as a fatal error.
    pub fn new(
        root: impl Into<PathBuf>,
        ignores: IgnoreMatcher,
    ) -> Result<(Self, SourceStreams), WatchError> {
        let (mut detector, streams) = Self::unwatched(root, ignores)?;
        let root = detector.root.clone();
        detector.add_recursive_watch(&root)?;
        info!(
            root = ?detector.root,
            watched = detector.watched.len(),
            "source watcher started"
        );
        Ok((detector, streams))
    }

    /// Create a detector that does not watch anything yet.
    ///
    /// Used when file watching is disabled: the streams stay open but stay
    /// silent.
    pub fn unwatched(
        root: impl Into<PathBuf>,
        ignores: IgnoreMatcher,
    ) -> Result<(Self, SourceStreams), WatchError> {
        let root = root.into();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<FileEvent>();
        let (error_tx, error_rx) = mpsc::unbounded_channel::<notify::Error>();

        // Called synchronously on notify's own thread.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for file_event in from_notify(&event) {
                        if event_tx.send(file_event).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    let _ = error_tx.send(err);
                }
            },
            Config::default(),
        )?;

        let detector = Self {
            root,
            ignores,
            watcher,
            watched: BTreeSet::new(),
        };
        let streams = SourceStreams {
            events: event_rx,
            errors: error_rx,
        };
        Ok((detector, streams))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ignores(&self) -> &IgnoreMatcher {
        &self.ignores
    }

    /// Paths currently registered with the OS watcher.
    pub fn watched_paths(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    /// Watch `path` and, if it is a directory, every directory below it that
    /// is not ignored. Ignored directories are pruned from the walk, so
    /// nothing inside them is ever visited.
    ///
    /// Missing paths are a no-op. Individual watch registrations that fail
    /// (e.g. the OS watch limit is exhausted) are logged and skipped.
    pub fn add_recursive_watch(&mut self, path: &Path) -> Result<(), WatchError> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(WatchError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if meta.is_file() {
            if !self.ignores.is_ignored(&self.root, path) {
                self.add_watch(path);
            }
            return Ok(());
        }
        if !meta.is_dir() {
            return Ok(());
        }

        let root = &self.root;
        let ignores = &self.ignores;
        let mut folders = Vec::new();
        let walker = WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                let ignored = ignores.is_ignored(root, entry.path());
                if ignored {
                    debug!(path = ?entry.path(), "ignoring watch on path");
                }
                !ignored
            });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        folders.push(entry.into_path());
                    }
                }
                Err(err) => {
                    // Entries can vanish between readdir and stat.
                    let vanished = err.path().is_some_and(|p| !p.exists());
                    if vanished {
                        debug!(error = %err, "walk hit a path that no longer exists");
                        continue;
                    }
                    return Err(WatchError::Walk {
                        path: path.to_path_buf(),
                        source: err,
                    });
                }
            }
        }

        for folder in folders {
            self.add_watch(&folder);
        }
        Ok(())
    }

    /// Stop watching `path` and anything registered below it.
    pub fn remove_watch(&mut self, path: &Path) {
        let doomed: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();

        for p in doomed {
            self.watched.remove(&p);
            match self.watcher.unwatch(&p) {
                Ok(()) => debug!(path = ?p, "removed watch"),
                // The OS usually drops the watch itself once the path is gone.
                Err(err) => debug!(path = ?p, error = %err, "error removing watch"),
            }
        }
    }

    fn add_watch(&mut self, path: &Path) {
        if self.watched.contains(path) {
            return;
        }
        match self.watcher.watch(path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(path = ?path, "adding watch on path");
                self.watched.insert(path.to_path_buf());
            }
            // Linux: raise fs.inotify.max_user_watches; BSD/macOS: kern.maxfiles.
            Err(err) => debug!(path = ?path, error = %err, "error adding watcher for path"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn seeds_watch_set_and_skips_ignored_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg/lib")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();

        let ignores = IgnoreMatcher::new(&["node_modules".to_string()]).unwrap();
        let (detector, _streams) = SourceWatcher::new(&root, ignores).unwrap();

        assert!(detector.is_watched(&root));
        assert!(detector.is_watched(&root.join("src")));
        assert!(detector.is_watched(&root.join("src/nested")));
        assert!(!detector.is_watched(&root.join("node_modules")));
        assert!(!detector.is_watched(&root.join("node_modules/pkg/lib")));
    }

    #[test]
    fn missing_root_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-yet");
        let (detector, _streams) =
            SourceWatcher::new(&missing, IgnoreMatcher::empty()).unwrap();
        assert_eq!(detector.watched_paths().count(), 0);
    }

    #[test]
    fn remove_watch_drops_nested_registrations() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();

        let (mut detector, _streams) =
            SourceWatcher::new(&root, IgnoreMatcher::empty()).unwrap();
        assert!(detector.is_watched(&root.join("a/b")));

        detector.remove_watch(&root.join("a"));
        assert!(!detector.is_watched(&root.join("a")));
        assert!(!detector.is_watched(&root.join("a/b")));
        assert!(detector.is_watched(&root));
    }
}
