//! Hand-off table for completed jobs.
//!
//! Workers publish a finished job's callback together with its result bytes;
//! the producer thread collects them during `Scheduler::update` and runs the
//! callbacks itself. Workers never invoke user callbacks.

use crate::core::{Callback, Result, SchedulerError};
use parking_lot::Mutex;

/// Capacity of the pending result table unless configured otherwise.
pub const DEFAULT_RESULT_CAPACITY: usize = 512;

/// A completed job waiting for its callback to run on the producer thread.
pub struct PendingResult {
    id: usize,
    job_id: u64,
    succeeded: bool,
    callback: Callback,
    data: Box<[u8]>,
}

impl PendingResult {
    /// Table index this entry occupied
    pub fn id(&self) -> usize {
        self.id
    }

    /// Id of the job that produced the result
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// True if the stored callback is the job's `on_success`
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Result bytes handed to the callback
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Run the callback with the result bytes, consuming the entry
    pub fn deliver(self) {
        (self.callback)(&self.data);
    }
}

impl std::fmt::Debug for PendingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResult")
            .field("id", &self.id)
            .field("job_id", &self.job_id)
            .field("succeeded", &self.succeeded)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Fixed-capacity table of [`PendingResult`]s guarded by one mutex.
///
/// An entry is free iff it is `None`. Publishing takes the first free entry;
/// there is no overflow storage, so a full table rejects the result.
pub struct PendingResultTable {
    entries: Mutex<Box<[Option<PendingResult>]>>,
}

impl PendingResultTable {
    /// Create a table with `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            entries: Mutex::new((0..capacity).map(|_| None).collect()),
        }
    }

    /// Number of entries
    pub fn capacity(&self) -> usize {
        self.entries.lock().len()
    }

    /// Number of results waiting for delivery
    pub fn len(&self) -> usize {
        self.entries.lock().iter().filter(|e| e.is_some()).count()
    }

    /// Returns true if no results are waiting
    pub fn is_empty(&self) -> bool {
        self.entries.lock().iter().all(|e| e.is_none())
    }

    /// Store a result in the first free entry and return its index.
    ///
    /// # Errors
    ///
    /// Returns `ResultTableFull` if every entry is occupied; the callback and
    /// data are dropped.
    pub fn publish(
        &self,
        job_id: u64,
        succeeded: bool,
        callback: Callback,
        data: Box<[u8]>,
    ) -> Result<usize> {
        let mut entries = self.entries.lock();
        let capacity = entries.len();
        let (id, entry) = entries
            .iter_mut()
            .enumerate()
            .find(|(_, e)| e.is_none())
            .ok_or_else(|| SchedulerError::result_table_full(capacity))?;

        *entry = Some(PendingResult {
            id,
            job_id,
            succeeded,
            callback,
            data,
        });
        Ok(id)
    }

    /// Remove every waiting result, in table order.
    ///
    /// The lock is released before the caller runs any callback.
    pub fn take_all(&self) -> Vec<PendingResult> {
        let mut entries = self.entries.lock();
        entries.iter_mut().filter_map(Option::take).collect()
    }

    /// Drop every waiting result without running callbacks
    pub fn clear(&self) -> usize {
        self.take_all().len()
    }
}

impl std::fmt::Debug for PendingResultTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResultTable")
            .field("capacity", &self.capacity())
            .field("pending", &self.len())
            .finish()
    }
}
