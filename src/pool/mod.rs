//! Scheduler, worker threads and the result hand-off table

pub mod config;
pub mod results;
pub mod scheduler;
pub mod slot;
pub mod stats;
pub mod worker;

pub use config::{SchedulerConfig, WorkerConfig, MAX_WORKERS};
pub use results::{PendingResult, PendingResultTable, DEFAULT_RESULT_CAPACITY};
pub use scheduler::Scheduler;
pub use slot::{SlotClaim, WorkerSlot};
pub use stats::{SchedulerCounters, SchedulerStats};
pub use worker::{WorkerStats, WorkerThread};
