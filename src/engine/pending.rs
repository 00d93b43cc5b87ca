// src/engine/pending.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::errors::WatchError;
use crate::fs::FileSystem;
use crate::watch::FileChanges;

/// Paths drained from a [`PendingChangeSet`] for one push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub changed: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// The batch was requested manually and must be pushed even if empty.
    pub forced: bool,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }

    /// Union of changed and deleted paths, sorted and deduplicated.
    pub fn affected_paths(&self) -> Vec<PathBuf> {
        let all: BTreeSet<&PathBuf> = self.changed.iter().chain(self.deleted.iter()).collect();
        all.into_iter().cloned().collect()
    }

    /// Re-check the batch against `fs` right before it is pushed.
    ///
    /// A changed path that no longer exists (an editor temp file created and
    /// removed inside one debounce window) moves to `deleted`. A deleted
    /// path that exists again is dropped from `deleted`; if it was also
    /// recorded as changed it stays there.
    pub fn settle(&mut self, fs: &dyn FileSystem) {
        let (present, vanished): (Vec<PathBuf>, Vec<PathBuf>) = std::mem::take(&mut self.changed)
            .into_iter()
            .partition(|path| fs.stat(path).is_ok());

        let mut deleted: BTreeSet<PathBuf> = std::mem::take(&mut self.deleted)
            .into_iter()
            .filter(|path| fs.stat(path).is_err())
            .collect();
        deleted.extend(vanished);

        self.changed = present;
        self.deleted = deleted.into_iter().collect();
    }
}

#[derive(Debug, Default)]
struct Inner {
    changed: BTreeSet<PathBuf>,
    deleted: BTreeSet<PathBuf>,
    dirty: bool,
    last_change: Option<Instant>,
    forced: bool,
    watch_error: Option<WatchError>,
}

/// Accumulator shared between the ingestion task and the event loop.
///
/// Every accessor takes the single internal lock, so "record", "check
/// settled" and "drain" never interleave. Pushes happen on a drained
/// [`ChangeBatch`], outside the lock.
#[derive(Debug, Default)]
pub struct PendingChangeSet {
    inner: Mutex<Inner>,
}

impl PendingChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State stays consistent even if a holder panicked mid-update.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge one debatcher result. Returns true if anything was recorded,
    /// in which case the set becomes dirty and `now` the last change.
    pub fn record(&self, changes: &FileChanges, now: Instant) -> bool {
        if changes.is_empty() {
            return false;
        }
        let mut inner = self.lock();
        inner.changed.extend(changes.changed.iter().cloned());
        inner.deleted.extend(changes.deleted.iter().cloned());
        inner.dirty = true;
        inner.last_change = Some(now);
        true
    }

    /// Request a push on the next check regardless of the debounce window.
    pub fn force_sync(&self) {
        let mut inner = self.lock();
        inner.forced = true;
        inner.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Dirty and either forced or quiet for at least `delay`.
    pub fn is_settled(&self, delay: Duration, now: Instant) -> bool {
        let inner = self.lock();
        if !inner.dirty {
            return false;
        }
        if inner.forced {
            return true;
        }
        match inner.last_change {
            Some(last) => now.saturating_duration_since(last) >= delay,
            None => true,
        }
    }

    /// Take both path sets and clear the dirty and forced flags atomically.
    pub fn drain(&self) -> ChangeBatch {
        let mut inner = self.lock();
        let batch = ChangeBatch {
            changed: std::mem::take(&mut inner.changed).into_iter().collect(),
            deleted: std::mem::take(&mut inner.deleted).into_iter().collect(),
            forced: inner.forced,
        };
        inner.dirty = false;
        inner.forced = false;
        inner.last_change = None;
        batch
    }

    /// Store a fatal watch error. Only the first one is kept.
    pub fn set_error(&self, err: WatchError) {
        let mut inner = self.lock();
        if inner.watch_error.is_none() {
            inner.watch_error = Some(err);
        }
    }

    pub fn take_error(&self) -> Option<WatchError> {
        self.lock().watch_error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn changes(changed: &[&str], deleted: &[&str]) -> FileChanges {
        FileChanges {
            changed: changed.iter().map(PathBuf::from).collect(),
            deleted: deleted.iter().map(PathBuf::from).collect(),
            ..FileChanges::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn settles_only_after_quiet_period_since_last_change() {
        let set = PendingChangeSet::new();
        let delay = Duration::from_secs(2);
        let t0 = Instant::now();

        assert!(set.record(&changes(&["/p/a"], &[]), t0));
        assert!(set.record(&changes(&["/p/b"], &[]), t0 + Duration::from_secs(1)));

        assert!(!set.is_settled(delay, t0 + Duration::from_secs(2)));
        assert!(set.is_settled(delay, t0 + Duration::from_secs(3)));

        let batch = set.drain();
        assert_eq!(batch.changed, vec![PathBuf::from("/p/a"), PathBuf::from("/p/b")]);
        assert!(!set.is_dirty());
        assert!(set.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn forced_sync_bypasses_debounce_and_empty_records_are_ignored() {
        let set = PendingChangeSet::new();
        let now = Instant::now();
        assert!(!set.record(&FileChanges::default(), now));
        assert!(!set.is_dirty());

        set.record(&changes(&[], &["/p/gone"]), now);
        set.force_sync();
        assert!(set.is_settled(Duration::from_secs(60), now));

        let batch = set.drain();
        assert!(batch.forced);
        assert_eq!(batch.deleted, vec![PathBuf::from("/p/gone")]);
        assert!(!set.is_settled(Duration::ZERO, now));
    }

    #[test]
    fn first_error_wins() {
        let set = PendingChangeSet::new();
        set.set_error(WatchError::FatalPush("first".into()));
        set.set_error(WatchError::Interrupted);
        assert!(matches!(set.take_error(), Some(WatchError::FatalPush(_))));
        assert!(set.take_error().is_none());
    }

    #[test]
    fn settle_moves_vanished_paths_to_deleted() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/kept.js");
        fs.add_file("/p/back.js");

        let mut batch = ChangeBatch {
            changed: vec!["/p/kept.js".into(), "/p/kept.js~".into()],
            deleted: vec!["/p/back.js".into(), "/p/gone.js".into()],
            forced: false,
        };
        batch.settle(&fs);

        assert_eq!(batch.changed, vec![PathBuf::from("/p/kept.js")]);
        assert_eq!(
            batch.deleted,
            vec![PathBuf::from("/p/gone.js"), PathBuf::from("/p/kept.js~")]
        );
    }

    #[test]
    fn affected_paths_is_a_sorted_union() {
        let batch = ChangeBatch {
            changed: vec!["/p/b".into(), "/p/a".into()],
            deleted: vec!["/p/a".into(), "/p/c".into()],
            forced: false,
        };
        assert_eq!(
            batch.affected_paths(),
            vec![PathBuf::from("/p/a"), PathBuf::from("/p/b"), PathBuf::from("/p/c")]
        );
    }
}
