//! Tracing integration for observability.
//!
//! Available with the `tracing` feature. Workers open a `worker` span for their
//! lifetime and a `job_execution` span per job; the functions in [`metrics`]
//! emit events that metrics layers (e.g. tracing-opentelemetry) can consume.
//!
//! # Example
//!
//! ```rust,ignore
//! use job_scheduler::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("job_scheduler=debug".parse().unwrap()))
//!     .init();
//!
//! let scheduler = Scheduler::init(SchedulerConfig::new(4))?;
//!
//! let span = tracing::info_span!("load_level", level = 3);
//! let _guard = span.enter();
//! // The entry point runs inside `load_level` on the worker thread
//! scheduler.submit_traced(Job::new(|_, _| Ok(()), &[], 0))?;
//! ```

use crate::core::{EntryPoint, Job};

/// Wrap a job so its entry point runs inside the span that is current now.
///
/// Span context does not follow a job across threads on its own; the span is
/// captured at this call and entered on the worker right before the entry
/// point runs.
pub fn traced(job: Job) -> Job {
    with_span(job, tracing::Span::current())
}

/// Wrap a job so its entry point runs inside `span`.
pub fn with_span(job: Job, span: tracing::Span) -> Job {
    job.map_entry(move |entry: EntryPoint| -> EntryPoint {
        Box::new(move |params: &[u8], result: &mut [u8]| {
            let _guard = span.enter();
            entry(params, result)
        })
    })
}

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
pub mod metrics {
    use crate::core::Priority;
    use std::time::Duration;

    /// Records a job submission event.
    #[inline]
    pub fn record_submission(priority: Priority, queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            priority = ?priority,
            "job submitted"
        );
    }

    /// Records a queued job handed to a worker during `update`.
    #[inline]
    pub fn record_dispatch(priority: Priority, remaining: usize) {
        tracing::trace!(
            counter.jobs_dispatched = 1,
            gauge.queue_depth = remaining as i64,
            priority = ?priority,
            "job dispatched"
        );
    }

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "job completed successfully"
            );
        } else {
            tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                "job failed"
            );
        }
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = 1, worker_id = worker_id, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records scheduler startup.
    #[inline]
    pub fn record_scheduler_start(num_workers: usize, queue_capacity: usize) {
        tracing::info!(
            workers = num_workers,
            queue_capacity = queue_capacity,
            "scheduler started"
        );
    }

    /// Records scheduler shutdown.
    #[inline]
    pub fn record_scheduler_shutdown(jobs_executed: u64, jobs_failed: u64) {
        tracing::info!(
            jobs_executed = jobs_executed,
            jobs_failed = jobs_failed,
            "scheduler shutdown complete"
        );
    }
}
