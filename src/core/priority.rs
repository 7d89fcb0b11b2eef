//! Priority tiers for job dispatch

use serde::{Deserialize, Serialize};

/// Job priority levels (higher number = higher priority)
///
/// Each level has its own bounded queue. `update()` drains the queues in
/// strict `High` -> `Normal` -> `Low` order, and only `High` jobs are
/// eligible for the direct-to-worker fast path at submit time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Priority {
    /// Lowest priority - background work, no starvation protection
    Low = 0,
    /// Normal priority - default for most jobs
    #[default]
    Normal = 1,
    /// High priority - may bypass the queue entirely
    High = 2,
}

impl Priority {
    /// Number of priority levels
    pub const COUNT: usize = 3;

    /// All levels in dispatch order (highest first)
    pub const DISPATCH_ORDER: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    /// Index of this level's queue
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}
