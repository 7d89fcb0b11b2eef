//! Job type masks for worker affinity.
//!
//! A job declares one or more type bits; a worker accepts a job when its
//! own mask shares at least one bit with the job's mask.

use bitflags::bitflags;

bitflags! {
    /// Bitmask pairing jobs with the workers allowed to run them.
    ///
    /// The named bits are conventions only. Any `u32` mask can be built with
    /// [`JobType::from_bits_retain`] for application-specific categories.
    ///
    /// # Example
    ///
    /// ```rust
    /// use job_scheduler::JobType;
    ///
    /// let loader = JobType::IO | JobType::GENERAL;
    /// assert!(loader.accepts(JobType::IO));
    /// assert!(!loader.accepts(JobType::COMPUTE));
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct JobType: u32 {
        /// General purpose work (default for new jobs)
        const GENERAL = 1 << 0;
        /// File and network IO
        const IO = 1 << 1;
        /// CPU-heavy computation
        const COMPUTE = 1 << 2;
        /// Asset decoding and upload preparation
        const ASSET = 1 << 3;
        /// Low importance housekeeping
        const BACKGROUND = 1 << 4;
    }
}

impl JobType {
    /// Mask accepted by a general-purpose worker: every bit set.
    pub const ANY: JobType = JobType::from_bits_retain(u32::MAX);

    /// Returns true if a worker with this mask may run a job of type `job`.
    #[inline]
    pub fn accepts(&self, job: JobType) -> bool {
        self.intersects(job)
    }
}

impl Default for JobType {
    fn default() -> Self {
        JobType::GENERAL
    }
}
