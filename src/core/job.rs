//! Job record and related types

use crate::core::error::Result;
use crate::core::{JobType, Priority};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Function run on a worker thread.
///
/// Receives the job's parameter bytes and its zeroed result buffer. Returning
/// `Ok` routes the result to `on_success`, returning `Err` routes it to `on_fail`.
pub type EntryPoint = Box<dyn FnOnce(&[u8], &mut [u8]) -> Result<()> + Send>;

/// Completion callback, always invoked on the thread calling `Scheduler::update`.
pub type Callback = Box<dyn FnOnce(&[u8]) + Send>;

/// A unit of work with owned parameter and result buffers.
///
/// Created on the producer thread, moved into exactly one worker slot and
/// destroyed by that worker once its result has been published.
///
/// # Example
///
/// ```rust
/// use job_scheduler::{Job, JobType, Priority};
///
/// let job = Job::new(
///     |params, result| {
///         result[0] = params.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
///         Ok(())
///     },
///     &[1, 2, 3],
///     1,
/// )
/// .on_success(|result| println!("sum = {}", result[0]))
/// .with_type(JobType::COMPUTE)
/// .with_priority(Priority::High);
///
/// assert_eq!(job.params(), &[1, 2, 3]);
/// ```
pub struct Job {
    id: u64,
    name: String,
    entry_point: EntryPoint,
    on_success: Option<Callback>,
    on_fail: Option<Callback>,
    param_data: Box<[u8]>,
    result_data: Box<[u8]>,
    job_type: JobType,
    priority: Priority,
}

impl Job {
    /// Create a job, copying `params` and allocating `result_size` zeroed bytes.
    ///
    /// The job starts as `JobType::GENERAL` / `Priority::Normal` with no callbacks.
    pub fn new<F>(entry_point: F, params: &[u8], result_size: usize) -> Self
    where
        F: FnOnce(&[u8], &mut [u8]) -> Result<()> + Send + 'static,
    {
        Self {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            name: "Job".to_string(),
            entry_point: Box::new(entry_point),
            on_success: None,
            on_fail: None,
            param_data: params.into(),
            result_data: vec![0u8; result_size].into_boxed_slice(),
            job_type: JobType::default(),
            priority: Priority::default(),
        }
    }

    /// Set the callback run when the entry point succeeds
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn on_success<C>(mut self, callback: C) -> Self
    where
        C: FnOnce(&[u8]) + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Set the callback run when the entry point fails or panics
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn on_fail<C>(mut self, callback: C) -> Self
    where
        C: FnOnce(&[u8]) + Send + 'static,
    {
        self.on_fail = Some(Box::new(callback));
        self
    }

    /// Set the type mask used for worker affinity
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_type(mut self, job_type: JobType) -> Self {
        self.job_type = job_type;
        self
    }

    /// Set the priority tier
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set a name for logs and debugging
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Process-unique job id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Job name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type mask
    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    /// Priority tier
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Parameter bytes copied at creation
    pub fn params(&self) -> &[u8] {
        &self.param_data
    }

    /// Size of the result buffer
    pub fn result_size(&self) -> usize {
        self.result_data.len()
    }

    /// Returns true if either completion callback is set
    pub fn has_callback(&self) -> bool {
        self.on_success.is_some() || self.on_fail.is_some()
    }

    #[cfg(feature = "tracing")]
    pub(crate) fn map_entry<W>(mut self, wrap: W) -> Self
    where
        W: FnOnce(EntryPoint) -> EntryPoint,
    {
        self.entry_point = wrap(self.entry_point);
        self
    }

    /// Split the job for execution on a worker thread.
    pub(crate) fn into_parts(self) -> JobParts {
        JobParts {
            id: self.id,
            name: self.name,
            entry_point: self.entry_point,
            on_success: self.on_success,
            on_fail: self.on_fail,
            param_data: self.param_data,
            result_data: self.result_data,
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("job_type", &self.job_type)
            .field("priority", &self.priority)
            .field("param_size", &self.param_data.len())
            .field("result_size", &self.result_data.len())
            .field("on_success", &self.on_success.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .finish()
    }
}

/// A job taken apart by the worker that runs it.
pub(crate) struct JobParts {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) entry_point: EntryPoint,
    pub(crate) on_success: Option<Callback>,
    pub(crate) on_fail: Option<Callback>,
    pub(crate) param_data: Box<[u8]>,
    pub(crate) result_data: Box<[u8]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SchedulerError;

    #[test]
    fn test_job_copies_params() {
        let mut source = vec![9u8, 8, 7, 6];
        let job = Job::new(|_, _| Ok(()), &source, 0);
        source[0] = 0;

        assert_eq!(job.params(), &[9, 8, 7, 6]);
    }

    #[test]
    fn test_result_buffer_is_zeroed() {
        let job = Job::new(|_, _| Ok(()), &[], 16);
        assert_eq!(job.result_size(), 16);
        assert!(job.into_parts().result_data.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_empty_buffers() {
        let job = Job::new(|_, _| Ok(()), &[], 0);
        assert!(job.params().is_empty());
        assert_eq!(job.result_size(), 0);
    }

    #[test]
    fn test_defaults() {
        let job = Job::new(|_, _| Ok(()), &[1], 1);
        assert_eq!(job.job_type(), JobType::GENERAL);
        assert_eq!(job.priority(), Priority::Normal);
        assert_eq!(job.name(), "Job");
        assert!(!job.has_callback());
    }

    #[test]
    fn test_builder_methods() {
        let job = Job::new(|_, _| Ok(()), &[], 0)
            .on_fail(|_| {})
            .with_type(JobType::IO)
            .with_priority(Priority::Low)
            .with_name("ReadTexture");

        assert!(job.has_callback());
        assert_eq!(job.job_type(), JobType::IO);
        assert_eq!(job.priority(), Priority::Low);
        assert_eq!(job.name(), "ReadTexture");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Job::new(|_, _| Ok(()), &[], 0);
        let b = Job::new(|_, _| Ok(()), &[], 0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_entry_point_sees_params() {
        let job = Job::new(
            |params, result| {
                result.copy_from_slice(params);
                Err(SchedulerError::other("stop"))
            },
            &[4, 5],
            2,
        );
        let mut parts = job.into_parts();
        let outcome = (parts.entry_point)(&parts.param_data, &mut parts.result_data);

        assert!(outcome.is_err());
        assert_eq!(&*parts.result_data, &[4, 5]);
    }
}
