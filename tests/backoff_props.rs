// tests/backoff_props.rs

use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use odo_watch::engine::{ExpBackoff, PendingChangeSet};
use odo_watch::watch::FileChanges;

const CAP: Duration = Duration::from_secs(60);

proptest! {
    #[test]
    fn backoff_delay_never_decreases_and_respects_cap(calls in 1usize..40) {
        let mut backoff = ExpBackoff::new();
        let mut previous = Duration::ZERO;
        for _ in 0..calls {
            let delay = backoff.delay();
            prop_assert!(delay >= previous);
            prop_assert!(delay <= CAP);
            previous = delay;
        }
    }

    #[test]
    fn backoff_reset_restarts_the_sequence(calls in 0usize..20) {
        let mut fresh = ExpBackoff::new();
        let first = fresh.delay();

        let mut backoff = ExpBackoff::new();
        for _ in 0..calls {
            backoff.delay();
        }
        backoff.reset();
        prop_assert_eq!(backoff.delay(), first);
    }

    /// However a burst is spaced, as long as every gap is shorter than the
    /// delay the set only settles `delay` after the last change, and then
    /// holds the union of everything recorded.
    #[test]
    fn burst_settles_only_after_the_last_change(
        delay_ms in 50u64..2_000,
        gaps in proptest::collection::vec(0u64..50, 1..20),
    ) {
        let delay = Duration::from_millis(delay_ms);
        let pending = PendingChangeSet::new();
        let mut now = Instant::now();

        for (i, gap) in gaps.iter().enumerate() {
            now += Duration::from_millis(*gap);
            let changes = FileChanges {
                changed: vec![format!("/p/f{i}").into()],
                ..FileChanges::default()
            };
            prop_assert!(pending.record(&changes, now));
            prop_assert!(!pending.is_settled(delay, now));
        }

        prop_assert!(!pending.is_settled(delay, now + delay - Duration::from_millis(1)));
        prop_assert!(pending.is_settled(delay, now + delay));

        let batch = pending.drain();
        prop_assert_eq!(batch.changed.len(), gaps.len());
        prop_assert!(!pending.is_dirty());
    }
}
