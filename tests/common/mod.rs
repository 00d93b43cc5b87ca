#![allow(dead_code)]

pub use odo_watch_test_utils::*;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use odo_watch::engine::{WatchParameters, WatchSession};
use odo_watch::errors::WatchError;
use odo_watch::fs::mock::MockFileSystem;
use odo_watch::watch::{FileEvent, FileOp};

pub const ROOT: &str = "/proj";

/// Session parameters over the in-memory tree at [`ROOT`]. The OS watcher
/// is off; file events are injected through [`Harness::touch`] and
/// [`Harness::remove`].
pub fn params(delay: Duration) -> WatchParameters {
    WatchParameters::new("nodejs", ROOT)
        .with_delay(delay)
        .with_watch_files(false)
}

/// Like [`params`], but with file watching on. Nothing exists at [`ROOT`]
/// on disk, so the OS watcher stays idle and events are still injected.
pub fn watching_params(delay: Duration) -> WatchParameters {
    params(delay).with_watch_files(true)
}

pub fn path(name: &str) -> PathBuf {
    PathBuf::from(ROOT).join(name)
}

/// Everything a test needs to drive and observe one session.
pub struct Harness {
    pub handler: RecordingPushHandler,
    pub out: SharedBuffer,
    pub fs: MockFileSystem,
    pub cancel: CancellationToken,
    events: mpsc::UnboundedSender<FileEvent>,
    watch_errors: mpsc::UnboundedSender<notify::Error>,
}

impl Harness {
    /// Build a session wired to a fresh harness. Further `with_*` calls can
    /// be chained on the returned session before [`Harness::spawn`].
    pub fn new(params: WatchParameters, handler: RecordingPushHandler) -> (Self, WatchSession) {
        let out = SharedBuffer::new();
        let fs = MockFileSystem::new();
        fs.add_dir(ROOT);
        let (tx, rx) = mpsc::unbounded_channel();
        let (err_tx, err_rx) = mpsc::unbounded_channel();

        let session = WatchSession::new(params, handler.boxed(), out.writer())
            .with_file_system(Arc::new(fs.clone()))
            .with_file_events(rx)
            .with_watch_errors(err_rx);

        let harness = Self {
            handler,
            out,
            fs,
            cancel: CancellationToken::new(),
            events: tx,
            watch_errors: err_tx,
        };
        (harness, session)
    }

    pub fn spawn(&self, session: WatchSession) -> JoinHandle<Result<(), WatchError>> {
        tokio::spawn(session.run(self.cancel.clone()))
    }

    /// Create or modify a file under the root.
    pub fn touch(&self, name: &str) {
        let p = path(name);
        self.fs.add_file(&p);
        self.events.send(FileEvent::new(p, FileOp::Write)).unwrap();
    }

    pub fn remove(&self, name: &str) {
        let p = path(name);
        self.fs.remove(&p);
        self.events.send(FileEvent::new(p, FileOp::Remove)).unwrap();
    }

    /// Report an internal watcher failure, as the OS watcher would.
    pub fn fail_watcher(&self, message: &str) {
        self.watch_errors.send(notify::Error::generic(message)).unwrap();
    }
}
