//! Scheduler counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Lock-free scheduler counters.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    submitted: AtomicU64,
    deduplicated: AtomicU64,
    reprioritized: AtomicU64,
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    stale_discards: AtomicU64,
    peak_active: AtomicUsize,
}

impl SchedulerStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reprioritized(&self) {
        self.reprioritized.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_started(&self, active: usize) {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.peak_active.fetch_max(active, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self, count: u64) {
        self.cancelled.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_discard(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters. `active` and `pending` come from the scheduler state.
    pub fn snapshot(&self, active: usize, pending: usize) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            reprioritized: self.reprioritized.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            stale_discards: self.stale_discards.load(Ordering::Relaxed),
            peak_active: self.peak_active.load(Ordering::Relaxed),
            active,
            pending,
        }
    }
}

/// Point-in-time copy of the scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStatsSnapshot {
    /// Requests passed to `submit`.
    pub submitted: u64,
    /// Submissions that were no-ops (already cached, queued or running).
    pub deduplicated: u64,
    /// Queued requests moved to a different priority.
    pub reprioritized: u64,
    /// Computations started on a worker.
    pub started: u64,
    /// Computations whose result was stored.
    pub completed: u64,
    /// Computations that returned an error or panicked.
    pub failed: u64,
    /// Requests cancelled before or during execution.
    pub cancelled: u64,
    /// Successful results dropped because they were no longer wanted.
    pub stale_discards: u64,
    /// Highest number of simultaneously active computations.
    pub peak_active: usize,
    pub active: usize,
    pub pending: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracks_maximum() {
        let stats = SchedulerStats::default();
        stats.record_started(3);
        stats.record_started(7);
        stats.record_started(2);

        let snapshot = stats.snapshot(2, 0);
        assert_eq!(snapshot.started, 3);
        assert_eq!(snapshot.peak_active, 7);
        assert_eq!(snapshot.active, 2);
    }

    #[test]
    fn test_cancelled_accumulates() {
        let stats = SchedulerStats::default();
        stats.record_cancelled(3);
        stats.record_cancelled(2);
        assert_eq!(stats.snapshot(0, 0).cancelled, 5);
    }
}
