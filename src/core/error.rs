//! Error types for the job scheduler

use crate::core::Priority;

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur in the job scheduler
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchedulerError {
    /// Scheduler is not running (never started or already shut down)
    #[error("Scheduler '{name}' is not running")]
    NotRunning {
        /// Thread name prefix of the scheduler
        name: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker}: {message}")]
    SpawnError {
        /// Index of the worker that failed to spawn
        worker: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{worker}: {message}")]
    JoinError {
        /// Index of the worker that failed to join
        worker: usize,
        /// Error message
        message: String,
    },

    /// Job entry point reported failure
    #[error("Job execution failed (job_id: {job_id}): {message}")]
    ExecutionError {
        /// ID of the failed job
        job_id: u64,
        /// Error message
        message: String,
    },

    /// Job entry point panicked on a worker
    #[error("Job {job_id} panicked on worker #{worker}: {message}")]
    WorkerPanic {
        /// Index of the worker running the job
        worker: usize,
        /// ID of the job
        job_id: u64,
        /// Panic message
        message: String,
    },

    /// Priority queue is full
    #[error("{priority:?} priority queue is full ({capacity} jobs queued)")]
    QueueFull {
        /// Priority level of the full queue
        priority: Priority,
        /// Capacity of the queue
        capacity: usize,
    },

    /// Pending result table has no free entry
    #[error("Pending result table is full ({capacity} entries)")]
    ResultTableFull {
        /// Capacity of the table
        capacity: usize,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl SchedulerError {
    /// Create a not running error
    pub fn not_running(name: impl Into<String>) -> Self {
        SchedulerError::NotRunning { name: name.into() }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        SchedulerError::SpawnError {
            worker,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(worker: usize, message: impl Into<String>) -> Self {
        SchedulerError::JoinError {
            worker,
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution(job_id: u64, message: impl Into<String>) -> Self {
        SchedulerError::ExecutionError {
            job_id,
            message: message.into(),
        }
    }

    /// Create a worker panic error
    pub fn worker_panic(worker: usize, job_id: u64, message: impl Into<String>) -> Self {
        SchedulerError::WorkerPanic {
            worker,
            job_id,
            message: message.into(),
        }
    }

    /// Create a queue full error
    pub fn queue_full(priority: Priority, capacity: usize) -> Self {
        SchedulerError::QueueFull { priority, capacity }
    }

    /// Create a result table full error
    pub fn result_table_full(capacity: usize) -> Self {
        SchedulerError::ResultTableFull { capacity }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        SchedulerError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SchedulerError::Other(msg.into())
    }
}
