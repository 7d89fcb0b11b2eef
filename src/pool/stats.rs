//! Scheduler-wide counters and snapshots.

use crossbeam_utils::CachePadded;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the producer side and the workers.
///
/// Producer-written and worker-written counters live on separate cache lines.
#[derive(Debug, Default)]
pub struct SchedulerCounters {
    submitted: CachePadded<AtomicU64>,
    fast_path: CachePadded<AtomicU64>,
    dispatched: CachePadded<AtomicU64>,
    dropped: CachePadded<AtomicU64>,
    delivered: CachePadded<AtomicU64>,
    results_lost: CachePadded<AtomicU64>,
    callbacks_panicked: CachePadded<AtomicU64>,
}

impl SchedulerCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submission(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fast_path(&self) {
        self.fast_path.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_result_lost(&self) {
        self.results_lost.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_callback_panic(&self) {
        self.callbacks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Jobs handed to `submit`/`try_submit`
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Jobs placed directly into a worker slot at submit time
    pub fn fast_path(&self) -> u64 {
        self.fast_path.load(Ordering::Relaxed)
    }

    /// Jobs moved from a queue to a worker during `update`
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Jobs rejected because their queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Callbacks run by `update`
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Results discarded because the pending result table was full
    pub fn results_lost(&self) -> u64 {
        self.results_lost.load(Ordering::Relaxed)
    }

    /// Callbacks that panicked inside `update`
    pub fn callbacks_panicked(&self) -> u64 {
        self.callbacks_panicked.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of a scheduler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Jobs handed to `submit`/`try_submit`.
    pub jobs_submitted: u64,
    /// Jobs that bypassed the queues.
    pub jobs_fast_path: u64,
    /// Jobs dispatched from a queue during `update`.
    pub jobs_dispatched: u64,
    /// Jobs rejected because their queue was full.
    pub jobs_dropped: u64,
    /// Jobs whose entry point returned `Ok`.
    pub jobs_succeeded: u64,
    /// Jobs whose entry point returned `Err`.
    pub jobs_failed: u64,
    /// Jobs whose entry point panicked.
    pub jobs_panicked: u64,
    /// Callbacks run by `update`.
    pub results_delivered: u64,
    /// Results discarded because the pending result table was full.
    pub results_lost: u64,
    /// Callbacks that panicked inside `update`.
    pub callbacks_panicked: u64,
    /// Results waiting for the next `update`.
    pub results_pending: usize,
    /// Queue depths in `[low, normal, high]` order.
    pub queue_depths: [usize; 3],
    /// Workers with an empty slot.
    pub idle_workers: usize,
}

impl SchedulerStats {
    /// Jobs that finished executing, whatever the outcome
    pub fn jobs_executed(&self) -> u64 {
        self.jobs_succeeded + self.jobs_failed + self.jobs_panicked
    }

    /// Jobs currently waiting in any queue
    pub fn jobs_queued(&self) -> usize {
        self.queue_depths.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = SchedulerCounters::new();
        assert_eq!(counters.submitted(), 0);
        assert_eq!(counters.dropped(), 0);
        assert_eq!(counters.results_lost(), 0);
    }

    #[test]
    fn test_counters_increment() {
        let counters = SchedulerCounters::new();
        counters.record_submission();
        counters.record_submission();
        counters.record_fast_path();
        counters.record_dispatch();
        counters.record_drop();
        counters.record_delivery();
        counters.record_result_lost();
        counters.record_callback_panic();

        assert_eq!(counters.submitted(), 2);
        assert_eq!(counters.fast_path(), 1);
        assert_eq!(counters.dispatched(), 1);
        assert_eq!(counters.dropped(), 1);
        assert_eq!(counters.delivered(), 1);
        assert_eq!(counters.results_lost(), 1);
        assert_eq!(counters.callbacks_panicked(), 1);
    }

    #[test]
    fn test_snapshot_totals() {
        let stats = SchedulerStats {
            jobs_succeeded: 3,
            jobs_failed: 2,
            jobs_panicked: 1,
            queue_depths: [1, 2, 3],
            ..Default::default()
        };
        assert_eq!(stats.jobs_executed(), 6);
        assert_eq!(stats.jobs_queued(), 6);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let stats = SchedulerStats {
            jobs_submitted: 4,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"jobs_submitted\":4"));

        let back: SchedulerStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
