//! Core types for the job scheduler

pub mod error;
pub mod job;
pub mod job_type;
pub mod priority;

pub use error::{Result, SchedulerError};
pub use job::{Callback, EntryPoint, Job};
pub use job_type::JobType;
pub use priority::Priority;
