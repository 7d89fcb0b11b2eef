//! Single-job mailbox owned by each worker.

use crate::core::Job;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// What a slot currently holds.
enum SlotState {
    /// No job; the worker is idle and may be assigned work.
    Idle,
    /// A job was placed but the worker has not picked it up yet.
    Assigned(Job),
    /// The worker took the job out and is executing it.
    Running(u64),
}

/// Per-worker mailbox holding at most one job.
///
/// The slot is empty exactly when its worker is idle. A job stays accounted
/// for (as `Running`) from the moment the worker picks it up until its result
/// has been published, so the producer never assigns a second job to a busy
/// worker.
pub struct WorkerSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl WorkerSlot {
    /// Create an idle slot
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Idle),
            ready: Condvar::new(),
        }
    }

    /// Returns true if the slot holds no job
    pub fn is_idle(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Idle)
    }

    /// Id of the job assigned to or running in this slot
    pub fn current_job(&self) -> Option<u64> {
        match &*self.state.lock() {
            SlotState::Idle => None,
            SlotState::Assigned(job) => Some(job.id()),
            SlotState::Running(id) => Some(*id),
        }
    }

    /// Lock the slot if it is idle.
    ///
    /// The returned claim keeps the slot locked until it is filled or dropped.
    pub fn claim(&self) -> Option<SlotClaim<'_>> {
        let guard = self.state.lock();
        if !matches!(*guard, SlotState::Idle) {
            return None;
        }
        Some(SlotClaim {
            guard,
            ready: &self.ready,
        })
    }

    /// Place a job into the slot if it is idle, otherwise hand it back.
    pub fn try_assign(&self, job: Job) -> Result<(), Job> {
        match self.claim() {
            Some(claim) => {
                claim.fill(job);
                Ok(())
            }
            None => Err(job),
        }
    }

    /// Wait up to `timeout` for an assigned job and mark it running.
    pub(crate) fn wait_for_job(&self, timeout: Duration) -> Option<Job> {
        let mut state = self.state.lock();
        if !matches!(*state, SlotState::Assigned(_)) {
            self.ready.wait_for(&mut state, timeout);
        }
        if !matches!(*state, SlotState::Assigned(_)) {
            return None;
        }
        let placeholder = SlotState::Running(0);
        match std::mem::replace(&mut *state, placeholder) {
            SlotState::Assigned(job) => {
                *state = SlotState::Running(job.id());
                Some(job)
            }
            other => {
                *state = other;
                None
            }
        }
    }

    /// Return the slot to idle after the running job finished
    pub(crate) fn release(&self) {
        *self.state.lock() = SlotState::Idle;
    }

    /// Remove a job that was assigned but never started
    pub(crate) fn take_assigned(&self) -> Option<Job> {
        let mut state = self.state.lock();
        if !matches!(*state, SlotState::Assigned(_)) {
            return None;
        }
        match std::mem::replace(&mut *state, SlotState::Idle) {
            SlotState::Assigned(job) => Some(job),
            _ => None,
        }
    }

    /// Wake the worker waiting on this slot
    pub(crate) fn wake(&self) {
        self.ready.notify_all();
    }
}

impl Default for WorkerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WorkerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerSlot")
            .field("current_job", &self.current_job())
            .finish()
    }
}

/// An idle slot held under lock, ready to receive one job.
pub struct SlotClaim<'a> {
    guard: MutexGuard<'a, SlotState>,
    ready: &'a Condvar,
}

impl SlotClaim<'_> {
    /// Place the job and wake the worker
    pub fn fill(mut self, job: Job) {
        *self.guard = SlotState::Assigned(job);
        drop(self.guard);
        self.ready.notify_one();
    }
}
