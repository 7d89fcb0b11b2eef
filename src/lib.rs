//! # Job Scheduler
//!
//! A fixed-size worker pool fed by three bounded priority queues, with
//! completion callbacks delivered on the producer's own thread.
//!
//! ## Features
//!
//! - **Priority Queues**: independent bounded FIFO queues for `High`, `Normal` and `Low` jobs
//! - **Fast Path**: `High` jobs go straight to an idle worker at submit time
//! - **Type Affinity**: each worker only runs jobs whose [`JobType`] intersects its mask
//! - **Main-Thread Callbacks**: `on_success`/`on_fail` run inside [`Scheduler::update`], never on a worker
//! - **Non-Blocking Backpressure**: a full queue drops the submission instead of blocking
//! - **Bounded Shutdown**: cooperative stop with a per-worker join timeout
//!
//! ## Quick Start
//!
//! ```rust
//! use job_scheduler::prelude::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let scheduler = Scheduler::init(SchedulerConfig::new(4))?;
//!
//! let done = Arc::new(AtomicUsize::new(0));
//! for i in 0..10u8 {
//!     let done = Arc::clone(&done);
//!     scheduler.submit(
//!         Job::new(
//!             |params, result| {
//!                 result[0] = params[0] + 1;
//!                 Ok(())
//!             },
//!             &[i],
//!             1,
//!         )
//!         .on_success(move |_| {
//!             done.fetch_add(1, Ordering::SeqCst);
//!         }),
//!     )?;
//! }
//!
//! // One tick per frame of the owning application
//! while done.load(Ordering::SeqCst) < 10 {
//!     scheduler.update();
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }
//!
//! scheduler.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Type Affinity
//!
//! ```rust
//! use job_scheduler::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = SchedulerConfig::new(1)
//!     .with_workers([JobType::ANY, JobType::IO | JobType::ASSET, JobType::COMPUTE])
//!     .with_thread_name_prefix("loader");
//!
//! let scheduler = Scheduler::init(config)?;
//! scheduler.submit(
//!     Job::new(|_, _| Ok(()), b"textures/grass.png", 0)
//!         .with_type(JobType::ASSET)
//!         .with_priority(Priority::High),
//! )?;
//! # scheduler.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Statistics
//!
//! ```rust
//! use job_scheduler::prelude::*;
//!
//! # fn main() -> Result<()> {
//! # let scheduler = Scheduler::init(SchedulerConfig::new(2))?;
//! # for _ in 0..10 {
//! #     scheduler.submit(Job::new(|_, _| Ok(()), &[], 0))?;
//! # }
//! # scheduler.update();
//! let stats = scheduler.stats();
//! println!(
//!     "{} submitted, {} executed, {} queued",
//!     stats.jobs_submitted,
//!     stats.jobs_executed(),
//!     stats.jobs_queued()
//! );
//!
//! for (i, worker) in scheduler.worker_stats().iter().enumerate() {
//!     println!("Worker {}: {} jobs", i, worker.get_jobs_executed());
//! }
//! # scheduler.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;

#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::core::{Callback, EntryPoint, Job, JobType, Priority, Result, SchedulerError};
pub use crate::pool::{Scheduler, SchedulerConfig, SchedulerStats, WorkerConfig, WorkerStats};
