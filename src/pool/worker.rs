//! Worker thread implementation

use crate::core::job::JobParts;
use crate::core::{Job, JobType, Result, SchedulerError};
use crate::pool::results::PendingResultTable;
use crate::pool::slot::WorkerSlot;
use crate::pool::stats::SchedulerCounters;
use log::{debug, error, warn};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Jobs whose entry point returned `Ok`
    pub jobs_succeeded: AtomicU64,
    /// Jobs whose entry point returned `Err`
    pub jobs_failed: AtomicU64,
    /// Jobs whose entry point panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent running entry points (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    fn increment_succeeded(&self) {
        self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get jobs that succeeded
    pub fn get_jobs_succeeded(&self) -> u64 {
        self.jobs_succeeded.load(Ordering::Relaxed)
    }

    /// Get jobs that failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get jobs that panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get jobs executed, whatever the outcome
    pub fn get_jobs_executed(&self) -> u64 {
        self.get_jobs_succeeded() + self.get_jobs_failed() + self.get_jobs_panicked()
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_executed();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// State shared by every worker of one scheduler.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) results: Arc<PendingResultTable>,
    pub(crate) counters: Arc<SchedulerCounters>,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) poll_interval: Duration,
}

/// A persistent worker thread with a single-job slot and a type mask.
///
/// The thread waits on its slot, runs the job it finds there synchronously
/// and publishes the chosen callback plus the result bytes to the pending
/// result table. It never calls a user callback itself.
#[derive(Debug)]
pub struct WorkerThread {
    index: usize,
    type_mask: JobType,
    slot: Arc<WorkerSlot>,
    stats: Arc<WorkerStats>,
    thread: Option<thread::JoinHandle<()>>,
}

impl WorkerThread {
    /// Create and start a worker
    pub(crate) fn spawn(
        index: usize,
        type_mask: JobType,
        context: WorkerContext,
        thread_name_prefix: &str,
    ) -> Result<Self> {
        let slot = Arc::new(WorkerSlot::new());
        let stats = Arc::new(WorkerStats::new());

        let thread_slot = Arc::clone(&slot);
        let thread_stats = Arc::clone(&stats);
        let thread = thread::Builder::new()
            .name(format!("{}-{}", thread_name_prefix, index))
            .spawn(move || {
                Self::run(index, thread_slot, thread_stats, context);
            })
            .map_err(|e| SchedulerError::spawn_with_source(index, e.to_string(), e))?;

        Ok(Self {
            index,
            type_mask,
            slot,
            stats,
            thread: Some(thread),
        })
    }

    /// Worker index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Job types this worker accepts
    pub fn type_mask(&self) -> JobType {
        self.type_mask
    }

    /// Returns true if this worker may run a job of type `job_type`
    pub fn accepts(&self, job_type: JobType) -> bool {
        self.type_mask.accepts(job_type)
    }

    /// Returns true if the worker's slot is empty
    pub fn is_idle(&self) -> bool {
        self.slot.is_idle()
    }

    /// The worker's job slot
    pub fn slot(&self) -> &WorkerSlot {
        &self.slot
    }

    /// Worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wake the thread so it notices a stop request
    pub(crate) fn wake(&self) {
        self.slot.wake();
    }

    /// Wait up to `timeout` for the thread to exit.
    ///
    /// Returns `Ok(false)` if the thread is still running a job when the
    /// timeout expires; the thread is then detached and its job abandoned.
    pub(crate) fn join_timeout(&mut self, timeout: Duration) -> Result<bool> {
        let Some(thread) = self.thread.take() else {
            return Ok(true);
        };

        let start = Instant::now();
        while !thread.is_finished() {
            if start.elapsed() >= timeout {
                warn!(
                    "Worker {} did not finish within {:?}; detaching (job {:?} abandoned)",
                    self.index,
                    timeout,
                    self.slot.current_job()
                );
                return Ok(false);
            }
            thread::sleep(Duration::from_millis(1));
        }

        thread
            .join()
            .map_err(|panic| SchedulerError::join(self.index, panic_message(panic.as_ref())))?;

        // A job placed after the thread saw the stop flag never started
        if let Some(job) = self.slot.take_assigned() {
            debug!("Worker {}: discarding unstarted job {}", self.index, job.id());
        }
        Ok(true)
    }

    /// Main worker loop
    fn run(index: usize, slot: Arc<WorkerSlot>, stats: Arc<WorkerStats>, context: WorkerContext) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", index = index);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        debug!("Worker {} started", index);

        while !context.stop.load(Ordering::Acquire) {
            let Some(job) = slot.wait_for_job(context.poll_interval) else {
                continue;
            };

            if context.stop.load(Ordering::Acquire) {
                debug!("Worker {}: stopping, job {} abandoned", index, job.id());
                drop(job);
                slot.release();
                break;
            }

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_busy(index);

            Self::execute_job(index, job, &stats, &context);
            slot.release();

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_idle(index);
        }

        debug!(
            "Worker {} exiting after {} jobs ({:.1} us average)",
            index,
            stats.get_jobs_executed(),
            stats.get_average_processing_time_us()
        );
    }

    /// Run one job and publish its result.
    fn execute_job(index: usize, job: Job, stats: &WorkerStats, context: &WorkerContext) {
        let JobParts {
            id,
            name,
            entry_point,
            on_success,
            on_fail,
            param_data,
            mut result_data,
        } = job.into_parts();

        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_id = id, job = %name);
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            entry_point(&param_data[..], &mut result_data[..])
        }));
        let elapsed = start.elapsed();

        let succeeded = match outcome {
            Ok(Ok(())) => {
                stats.increment_succeeded();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed, true);
                true
            }
            Ok(Err(e)) => {
                let err = SchedulerError::execution(id, e.to_string());
                warn!("Worker {}: {} ({})", index, err, name);
                stats.increment_failed();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed, false);
                false
            }
            Err(panic) => {
                let err = SchedulerError::worker_panic(index, id, panic_message(panic.as_ref()));
                warn!("{} ({})", err, name);
                stats.increment_panicked();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
                false
            }
        };
        stats.add_processing_time(elapsed.as_micros() as u64);

        // The parameter copy is no longer needed once the entry point returned
        drop(param_data);

        let callback = if succeeded { on_success } else { on_fail };
        if let Some(callback) = callback {
            if let Err(e) = context
                .results
                .publish(id, succeeded, callback, result_data)
            {
                error!("Worker {}: result of job {} lost: {}", index, id, e);
                context.counters.record_result_lost();
            }
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        if self.thread.is_some() {
            const JOIN_TIMEOUT: Duration = Duration::from_secs(5);
            self.wake();
            if let Err(e) = self.join_timeout(JOIN_TIMEOUT) {
                error!("{}", e);
            }
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
