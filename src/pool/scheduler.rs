//! The job scheduler: priority queues, worker slots and result hand-off.

use crate::core::{Job, Priority, Result, SchedulerError};
use crate::pool::config::SchedulerConfig;
use crate::pool::results::PendingResultTable;
use crate::pool::stats::{SchedulerCounters, SchedulerStats};
use crate::pool::worker::{panic_message, WorkerContext, WorkerStats, WorkerThread};
use crate::queue::PriorityQueues;
use log::{debug, error, info, trace, warn};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A fixed pool of worker threads fed from three bounded priority queues.
///
/// Exactly one producer thread is expected to call [`submit`](Self::submit)
/// and [`update`](Self::update). Workers run entry points; completion
/// callbacks only ever run inside `update`, on the caller's thread.
///
/// # Dispatch
///
/// - `High` jobs are placed directly into the first idle matching worker at
///   submit time, falling back to the high queue when none is idle.
/// - Every `update` drains the queues in `High`, `Normal`, `Low` order. A
///   level stops draining as soon as its head job has no idle matching
///   worker; the rest stays queued for the next tick.
/// - A full queue drops the submission (logged); `try_submit` reports it.
///
/// # Shutdown
///
/// `shutdown` sets a stop flag, wakes every worker and joins each one within
/// the configured timeout. Workers stuck in a long job are detached and their
/// job abandoned. Queued jobs and undelivered results are dropped without
/// running their callbacks.
///
/// # Example
///
/// ```rust
/// use job_scheduler::prelude::*;
/// use std::sync::atomic::{AtomicU8, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let scheduler = Scheduler::init(SchedulerConfig::new(2))?;
///
/// let answer = Arc::new(AtomicU8::new(0));
/// let answer_clone = Arc::clone(&answer);
/// scheduler.submit(
///     Job::new(
///         |params, result| {
///             result[0] = params[0] * 2;
///             Ok(())
///         },
///         &[21],
///         1,
///     )
///     .on_success(move |result| answer_clone.store(result[0], Ordering::SeqCst)),
/// )?;
///
/// while answer.load(Ordering::SeqCst) == 0 {
///     scheduler.update();
///     std::thread::sleep(std::time::Duration::from_millis(1));
/// }
/// assert_eq!(answer.load(Ordering::SeqCst), 42);
///
/// scheduler.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    config: SchedulerConfig,
    queues: PriorityQueues,
    workers: RwLock<Vec<WorkerThread>>,
    worker_stats: Vec<Arc<WorkerStats>>,
    results: Arc<PendingResultTable>,
    counters: Arc<SchedulerCounters>,
    running: AtomicBool,
    stop: Arc<AtomicBool>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("queues", &self.queues)
            .field("results", &self.results)
            .finish()
    }
}

impl Scheduler {
    /// Start a scheduler with the default configuration
    pub fn new() -> Result<Self> {
        Self::init(SchedulerConfig::default())
    }

    /// Start a scheduler with `num_workers` general-purpose workers
    pub fn with_threads(num_workers: usize) -> Result<Self> {
        Self::init(SchedulerConfig::new(num_workers))
    }

    /// Validate `config`, allocate the queues and result table and spawn
    /// every worker thread.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a rejected configuration, or `SpawnError`
    /// if a worker thread cannot be created. Workers spawned before the
    /// failure are stopped before returning.
    pub fn init(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;

        let results = Arc::new(PendingResultTable::new(config.result_capacity));
        let counters = Arc::new(SchedulerCounters::new());
        let stop = Arc::new(AtomicBool::new(false));
        let context = WorkerContext {
            results: Arc::clone(&results),
            counters: Arc::clone(&counters),
            stop: Arc::clone(&stop),
            poll_interval: config.poll_interval,
        };

        let mut workers = Vec::with_capacity(config.num_workers());
        for (index, worker) in config.workers.iter().enumerate() {
            match WorkerThread::spawn(
                index,
                worker.type_mask,
                context.clone(),
                &config.thread_name_prefix,
            ) {
                Ok(thread) => workers.push(thread),
                Err(e) => {
                    error!("Scheduler '{}': {}", config.thread_name_prefix, e);
                    stop.store(true, Ordering::Release);
                    for mut started in workers {
                        started.wake();
                        if let Err(join_err) = started.join_timeout(config.join_timeout) {
                            error!("{}", join_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        info!(
            "Scheduler '{}' started with {} workers (queue capacity {}, result capacity {})",
            config.thread_name_prefix,
            workers.len(),
            config.queue_capacity,
            config.result_capacity
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_scheduler_start(workers.len(), config.queue_capacity);

        let worker_stats = workers.iter().map(WorkerThread::stats).collect();
        Ok(Self {
            queues: PriorityQueues::new(config.queue_capacity),
            config,
            workers: RwLock::new(workers),
            worker_stats,
            results,
            counters,
            running: AtomicBool::new(true),
            stop,
        })
    }

    /// Submit a job without waiting.
    ///
    /// A `High` job goes straight to an idle matching worker when one exists.
    /// Otherwise the job is appended to its priority queue; if that queue is
    /// full the job is dropped and an error is logged, but `Ok` is still
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` after [`shutdown`](Self::shutdown).
    pub fn submit(&self, job: Job) -> Result<()> {
        if let Some(job) = self.route(job)? {
            let priority = job.priority();
            error!(
                "{}; dropping job {} ({})",
                SchedulerError::queue_full(priority, self.queues.capacity()),
                job.id(),
                job.name()
            );
        }
        Ok(())
    }

    /// Submit a job, reporting a full queue instead of dropping silently.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` after shutdown, or `QueueFull` if the job's
    /// priority queue has no room. The rejected job is dropped.
    pub fn try_submit(&self, job: Job) -> Result<()> {
        match self.route(job)? {
            None => Ok(()),
            Some(job) => Err(SchedulerError::queue_full(
                job.priority(),
                self.queues.capacity(),
            )),
        }
    }

    /// Place a job in a worker slot or queue. Returns the job if its queue is full.
    fn route(&self, job: Job) -> Result<Option<Job>> {
        if !self.is_running() {
            return Err(SchedulerError::not_running(&self.config.thread_name_prefix));
        }
        self.counters.record_submission();

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(job.priority(), self.queues.total_len());

        if job.priority() == Priority::High {
            let workers = self.workers.read();
            let job_type = job.job_type();
            let claim = workers
                .iter()
                .filter(|w| w.accepts(job_type))
                .find_map(|w| w.slot().claim());
            if let Some(claim) = claim {
                trace!("Job {} assigned directly to an idle worker", job.id());
                claim.fill(job);
                self.counters.record_fast_path();
                return Ok(None);
            }
        }

        match self.queues.push(job) {
            Ok(()) => {
                // Shutdown may have cleared the queues since the check above
                if !self.is_running() {
                    let discarded = self.queues.clear();
                    debug!("Discarded {} jobs queued during shutdown", discarded);
                    return Err(SchedulerError::not_running(&self.config.thread_name_prefix));
                }
                Ok(None)
            }
            Err(job) => {
                self.counters.record_drop();
                Ok(Some(job))
            }
        }
    }

    /// Run one scheduler tick on the producer thread.
    ///
    /// First dispatches queued jobs to idle matching workers, highest priority
    /// first, then runs the callback of every result published since the
    /// previous tick. Does nothing after shutdown.
    pub fn update(&self) {
        if !self.is_running() {
            return;
        }
        self.process_queues();
        self.deliver_results();
    }

    fn process_queues(&self) {
        let workers = self.workers.read();
        for priority in Priority::DISPATCH_ORDER {
            let mut queue = self.queues.lock(priority);
            while let Some(head) = queue.peek() {
                let job_type = head.job_type();
                let Some(claim) = workers
                    .iter()
                    .filter(|w| w.accepts(job_type))
                    .find_map(|w| w.slot().claim())
                else {
                    break;
                };
                let Some(job) = queue.dequeue() else {
                    break;
                };
                trace!("Dispatching {:?} job {}", priority, job.id());
                claim.fill(job);
                self.counters.record_dispatch();

                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_dispatch(priority, queue.len());
            }
        }
    }

    fn deliver_results(&self) {
        // The table lock is released before any callback runs
        for result in self.results.take_all() {
            trace!(
                "Delivering result of job {} (succeeded: {})",
                result.job_id(),
                result.succeeded()
            );
            let job_id = result.job_id();
            match catch_unwind(AssertUnwindSafe(|| result.deliver())) {
                Ok(()) => self.counters.record_delivery(),
                Err(panic) => {
                    error!(
                        "Callback of job {} panicked: {}",
                        job_id,
                        panic_message(panic.as_ref())
                    );
                    self.counters.record_callback_panic();
                }
            }
        }
    }

    /// Stop every worker and release queued jobs and pending results.
    ///
    /// Idempotent; calls after the first return `Ok(())` immediately.
    ///
    /// # Errors
    ///
    /// Returns `JoinError` if a worker thread itself panicked. The remaining
    /// workers are still joined and all resources released.
    pub fn shutdown(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        debug!("Scheduler '{}' shutting down", self.config.thread_name_prefix);
        self.stop.store(true, Ordering::Release);

        let mut workers = std::mem::take(&mut *self.workers.write());
        for worker in &workers {
            worker.wake();
        }

        let mut first_error = None;
        let mut detached = 0;
        for worker in workers.iter_mut() {
            match worker.join_timeout(self.config.join_timeout) {
                Ok(true) => {}
                Ok(false) => detached += 1,
                Err(e) => {
                    error!("{}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        drop(workers);

        let dropped_jobs = self.queues.clear();
        let dropped_results = self.results.clear();
        if detached > 0 {
            warn!(
                "Scheduler '{}': {} workers detached while running a job",
                self.config.thread_name_prefix, detached
            );
        }
        info!(
            "Scheduler '{}' stopped ({} queued jobs and {} pending results discarded)",
            self.config.thread_name_prefix, dropped_jobs, dropped_results
        );

        #[cfg(feature = "tracing")]
        {
            let stats = self.stats();
            crate::tracing::metrics::record_scheduler_shutdown(
                stats.jobs_executed(),
                stats.jobs_failed + stats.jobs_panicked,
            );
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Check if the scheduler accepts work
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The configuration the scheduler was started with
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of worker threads
    pub fn num_workers(&self) -> usize {
        self.config.num_workers()
    }

    /// Jobs waiting in the queue for `priority`
    pub fn queue_len(&self, priority: Priority) -> usize {
        self.queues.len(priority)
    }

    /// Results waiting for the next `update`
    pub fn pending_results(&self) -> usize {
        self.results.len()
    }

    /// Workers whose slot is currently empty
    pub fn idle_workers(&self) -> usize {
        self.workers.read().iter().filter(|w| w.is_idle()).count()
    }

    /// Get statistics for all workers, indexed by worker id
    pub fn worker_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.worker_stats.clone()
    }

    /// Take a snapshot of the scheduler counters
    pub fn stats(&self) -> SchedulerStats {
        let (succeeded, failed, panicked) =
            self.worker_stats
                .iter()
                .fold((0, 0, 0), |(s, f, p), stats| {
                    (
                        s + stats.get_jobs_succeeded(),
                        f + stats.get_jobs_failed(),
                        p + stats.get_jobs_panicked(),
                    )
                });

        SchedulerStats {
            jobs_submitted: self.counters.submitted(),
            jobs_fast_path: self.counters.fast_path(),
            jobs_dispatched: self.counters.dispatched(),
            jobs_dropped: self.counters.dropped(),
            jobs_succeeded: succeeded,
            jobs_failed: failed,
            jobs_panicked: panicked,
            results_delivered: self.counters.delivered(),
            results_lost: self.counters.results_lost(),
            callbacks_panicked: self.counters.callbacks_panicked(),
            results_pending: self.results.len(),
            queue_depths: [
                self.queues.len(Priority::Low),
                self.queues.len(Priority::Normal),
                self.queues.len(Priority::High),
            ],
            idle_workers: self.idle_workers(),
        }
    }

    /// Submit a job whose entry point runs inside the caller's current span.
    #[cfg(feature = "tracing")]
    pub fn submit_traced(&self, job: Job) -> Result<()> {
        self.submit(crate::tracing::traced(job))
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.shutdown() {
                error!(
                    "Failed to shut down scheduler '{}' during drop: {}",
                    self.config.thread_name_prefix, e
                );
            }
        }
    }
}
