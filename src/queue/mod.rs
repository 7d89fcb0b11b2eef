//! Bounded per-priority job queues.
//!
//! - [`BoundedQueue`]: fixed-capacity FIFO ring buffer, unsynchronized
//! - [`PriorityQueues`]: one mutex-guarded [`BoundedQueue`] per [`Priority`]
//!
//! Each priority level has an independent lock so submitting a `Low` job never
//! contends with draining the `High` queue.

mod bounded;

pub use bounded::BoundedQueue;

use crate::core::{Job, Priority};
use parking_lot::{Mutex, MutexGuard};

/// Capacity of each priority queue unless configured otherwise.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// The three priority queues owned by a scheduler.
pub struct PriorityQueues {
    queues: [Mutex<BoundedQueue<Job>>; Priority::COUNT],
}

impl PriorityQueues {
    /// Creates one queue of `capacity` jobs per priority level.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: std::array::from_fn(|_| Mutex::new(BoundedQueue::new(capacity))),
        }
    }

    /// Appends a job to the queue matching its priority.
    ///
    /// Returns the job if that queue is full.
    pub fn push(&self, job: Job) -> Result<(), Job> {
        self.queues[job.priority().index()].lock().enqueue(job)
    }

    /// Locks the queue for one priority level.
    pub(crate) fn lock(&self, priority: Priority) -> MutexGuard<'_, BoundedQueue<Job>> {
        self.queues[priority.index()].lock()
    }

    /// Number of jobs queued at `priority`.
    pub fn len(&self, priority: Priority) -> usize {
        self.queues[priority.index()].lock().len()
    }

    /// Total jobs queued across all levels.
    pub fn total_len(&self) -> usize {
        self.queues.iter().map(|q| q.lock().len()).sum()
    }

    /// Capacity of each queue.
    pub fn capacity(&self) -> usize {
        self.queues[0].lock().capacity()
    }

    /// Drops every queued job, returning how many were discarded.
    pub fn clear(&self) -> usize {
        self.queues
            .iter()
            .map(|q| {
                let mut queue = q.lock();
                let dropped = queue.len();
                queue.clear();
                dropped
            })
            .sum()
    }
}

impl std::fmt::Debug for PriorityQueues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueues")
            .field("high", &self.len(Priority::High))
            .field("normal", &self.len(Priority::Normal))
            .field("low", &self.len(Priority::Low))
            .finish()
    }
}
