//! Configuration for the job scheduler.

use crate::core::{JobType, Result, SchedulerError};
use crate::pool::results::DEFAULT_RESULT_CAPACITY;
use crate::queue::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the number of worker threads.
pub const MAX_WORKERS: usize = 32;

/// Per-worker settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Job types this worker accepts.
    pub type_mask: JobType,
}

impl WorkerConfig {
    /// Worker accepting the given job types
    pub fn new(type_mask: JobType) -> Self {
        Self { type_mask }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(JobType::ANY)
    }
}

/// Configuration for a [`Scheduler`](crate::pool::Scheduler).
///
/// The worker list fixes both the pool size and each worker's type affinity;
/// the pool is never resized after `init`.
///
/// # Example
///
/// ```rust
/// use job_scheduler::{JobType, SchedulerConfig};
/// use std::time::Duration;
///
/// let config = SchedulerConfig::new(2)
///     .add_worker(JobType::IO)
///     .with_queue_capacity(256)
///     .with_poll_interval(Duration::from_millis(5))
///     .with_thread_name_prefix("loader");
///
/// assert_eq!(config.num_workers(), 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// One entry per worker thread, indexed by worker id.
    pub workers: Vec<WorkerConfig>,

    /// Capacity of each priority queue.
    pub queue_capacity: usize,

    /// Capacity of the pending result table.
    pub result_capacity: usize,

    /// How long an idle worker sleeps before re-checking its slot.
    ///
    /// Assignment wakes the worker immediately; the interval bounds how long
    /// a worker takes to notice shutdown.
    pub poll_interval: Duration,

    /// How long `shutdown` waits for each worker before detaching it.
    pub join_timeout: Duration,

    /// Thread name prefix.
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: vec![WorkerConfig::default(); num_cpus::get().clamp(1, MAX_WORKERS)],
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            result_capacity: DEFAULT_RESULT_CAPACITY,
            poll_interval: Duration::from_millis(10),
            join_timeout: Duration::from_secs(5),
            thread_name_prefix: "job-worker".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with `num_workers` general-purpose workers.
    ///
    /// Zero means one worker per CPU (capped at [`MAX_WORKERS`]).
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        if num_workers == 0 {
            return Self::default();
        }
        Self {
            workers: vec![WorkerConfig::default(); num_workers],
            ..Default::default()
        }
    }

    /// Replace the worker list with one worker per type mask
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_workers<I>(mut self, masks: I) -> Self
    where
        I: IntoIterator<Item = JobType>,
    {
        self.workers = masks.into_iter().map(WorkerConfig::new).collect();
        self
    }

    /// Append a worker accepting `type_mask`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn add_worker(mut self, type_mask: JobType) -> Self {
        self.workers.push(WorkerConfig::new(type_mask));
        self
    }

    /// Set the capacity of each priority queue
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the capacity of the pending result table
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }

    /// Set the idle poll interval.
    ///
    /// # Panics
    ///
    /// Panics if interval is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "poll interval must be non-zero");
        self.poll_interval = interval;
        self
    }

    /// Set how long shutdown waits for each worker
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Number of worker threads
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.workers.is_empty() || self.workers.len() > MAX_WORKERS {
            return Err(SchedulerError::invalid_config(
                "workers",
                format!(
                    "worker count must be between 1 and {}, got {}",
                    MAX_WORKERS,
                    self.workers.len()
                ),
            ));
        }
        if let Some(index) = self.workers.iter().position(|w| w.type_mask.is_empty()) {
            return Err(SchedulerError::invalid_config(
                "workers",
                format!("worker #{} accepts no job types", index),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(SchedulerError::invalid_config(
                "queue_capacity",
                "queue capacity must be greater than 0",
            ));
        }
        if self.result_capacity == 0 {
            return Err(SchedulerError::invalid_config(
                "result_capacity",
                "result table capacity must be greater than 0",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(SchedulerError::invalid_config(
                "poll_interval",
                "poll interval must be non-zero",
            ));
        }
        Ok(())
    }
}
