//! Convenient re-exports for common types

pub use crate::core::{Job, JobType, Priority, Result, SchedulerError};
pub use crate::pool::{Scheduler, SchedulerConfig, SchedulerStats, WorkerStats};
