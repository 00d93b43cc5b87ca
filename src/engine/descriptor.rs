// src/engine/descriptor.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::pending::PendingChangeSet;
use crate::errors::WatchError;
use crate::watch::{IgnoreMatcher, SourceStreams, SourceWatcher};

/// Quiet period after a descriptor change before the component is updated.
pub const DESCRIPTOR_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches the component descriptor files and sends one signal per burst
/// of changes on `updates`.
///
/// Watcher errors are fatal, like those of the source watcher: they are
/// stored in `pending` and the event loop is woken to pick them up.
pub(crate) struct DescriptorWatch {
    detector: SourceWatcher,
    streams: SourceStreams,
    updates: mpsc::Sender<()>,
    pending: Arc<PendingChangeSet>,
    wake: Arc<Notify>,
}

impl DescriptorWatch {
    pub(crate) fn new(
        root: &Path,
        paths: &[PathBuf],
        updates: mpsc::Sender<()>,
        pending: Arc<PendingChangeSet>,
        wake: Arc<Notify>,
    ) -> Result<Self, WatchError> {
        let (mut detector, streams) = SourceWatcher::unwatched(root, IgnoreMatcher::empty())?;
        for path in paths {
            if let Err(err) = detector.add_recursive_watch(path) {
                debug!(path = ?path, error = %err, "cannot watch component descriptor");
            }
        }
        debug!(watched = detector.watched_paths().count(), "descriptor watcher started");
        Ok(Self {
            detector,
            streams,
            updates,
            pending,
            wake,
        })
    }

    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                event = self.streams.events.recv() => {
                    if event.is_none() {
                        return;
                    }
                }
                err = self.streams.errors.recv() => {
                    if let Some(err) = err {
                        self.fail(WatchError::Notify(err));
                    }
                    return;
                }
            }

            // Every further event restarts the quiet period.
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(DESCRIPTOR_DEBOUNCE) => break,
                    event = self.streams.events.recv() => {
                        if event.is_none() {
                            return;
                        }
                    }
                }
            }

            match self.updates.try_send(()) {
                // An update is already queued.
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Closed(())) => return,
            }
        }
    }

    fn fail(&self, err: WatchError) {
        warn!(error = %err, root = ?self.detector.root(), "descriptor watcher failed");
        self.pending.set_error(err);
        self.wake.notify_one();
    }
}
