use chestward_common::{MILLIS_PER_DAY, days_to_millis};
use chestward_persist::AccessLogStore;

/// How long access records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub days: u32,
}

impl RetentionPolicy {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    /// Zero days disables pruning.
    pub fn is_enabled(self) -> bool {
        self.days > 0
    }

    /// Oldest timestamp that survives a sweep at `now_millis`.
    pub fn cutoff(self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(days_to_millis(self.days))
    }

    /// Prune `store` as of `now_millis`, returning how many records were removed.
    pub fn sweep(self, store: &mut AccessLogStore, now_millis: i64) -> usize {
        if !self.is_enabled() {
            tracing::debug!("retention disabled, skipping sweep");
            return 0;
        }
        store.prune_older_than(self.cutoff(now_millis))
    }
}

/// Runs a [`RetentionPolicy`] at most once per interval.
///
/// Meant to be polled from the host's tick loop; the first poll always sweeps.
#[derive(Debug)]
pub struct RetentionSweeper {
    policy: RetentionPolicy,
    interval_millis: i64,
    last_sweep_millis: Option<i64>,
}

impl RetentionSweeper {
    /// Sweep once per day.
    pub fn daily(policy: RetentionPolicy) -> Self {
        Self::with_interval(policy, MILLIS_PER_DAY)
    }

    pub fn with_interval(policy: RetentionPolicy, interval_millis: i64) -> Self {
        Self {
            policy,
            interval_millis,
            last_sweep_millis: None,
        }
    }

    pub fn is_due(&self, now_millis: i64) -> bool {
        self.last_sweep_millis
            .is_none_or(|last| now_millis.saturating_sub(last) >= self.interval_millis)
    }

    /// Sweep if due. Returns the number removed, or `None` if it was not time yet.
    pub fn poll(&mut self, store: &mut AccessLogStore, now_millis: i64) -> Option<usize> {
        if !self.is_due(now_millis) {
            return None;
        }
        self.last_sweep_millis = Some(now_millis);
        Some(self.policy.sweep(store, now_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chestward_common::BlockPos;
    use chestward_kernel::AccessLogRecord;

    const DAY: i64 = MILLIS_PER_DAY;

    fn store_with_ages(dir: &std::path::Path, now: i64, ages_in_days: &[i64]) -> AccessLogStore {
        let mut store = AccessLogStore::open(dir.join("chest_logs.dat"));
        for age in ages_in_days {
            store.append(AccessLogRecord::restore(
                "Alex".into(),
                BlockPos::default(),
                "minecraft:overworld".into(),
                now - age * DAY,
                vec!["stone x1".into()],
                Vec::new(),
            ));
        }
        store
    }

    #[test]
    fn cutoff_is_days_before_now() {
        let policy = RetentionPolicy::new(30);
        assert_eq!(policy.cutoff(100 * DAY), 70 * DAY);
    }

    #[test]
    fn sweep_drops_only_expired_records() {
        let tmp = tempfile::tempdir().unwrap();
        let now = 1_000 * DAY;
        let mut store = store_with_ages(tmp.path(), now, &[45, 10, 31, 30, 0]);

        assert_eq!(RetentionPolicy::new(30).sweep(&mut store, now), 2);
        assert_eq!(store.count(), 3);
        assert!(store.all().iter().all(|r| r.timestamp_millis() >= now - 30 * DAY));
    }

    #[test]
    fn zero_days_keeps_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let now = 1_000 * DAY;
        let mut store = store_with_ages(tmp.path(), now, &[400, 1]);
        assert_eq!(RetentionPolicy::new(0).sweep(&mut store, now), 0);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn sweeper_runs_once_per_interval() {
        let tmp = tempfile::tempdir().unwrap();
        let now = 1_000 * DAY;
        let mut store = store_with_ages(tmp.path(), now, &[10, 3, 1]);
        let mut sweeper = RetentionSweeper::daily(RetentionPolicy::new(5));

        assert_eq!(sweeper.poll(&mut store, now), Some(1));
        assert_eq!(sweeper.poll(&mut store, now + DAY - 1), None);
        assert!(!sweeper.is_due(now + DAY / 2));

        // A day later the 3-day-old record is still inside the window.
        assert_eq!(sweeper.poll(&mut store, now + DAY), Some(0));
        assert_eq!(sweeper.poll(&mut store, now + 3 * DAY), Some(1));
        assert_eq!(store.count(), 1);
    }
}
