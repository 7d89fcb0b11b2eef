//! Fixed-capacity FIFO ring buffer.

use std::fmt;

/// A bounded FIFO ring buffer.
///
/// Storage for `capacity` items is allocated once at construction and never
/// grows. `enqueue` on a full queue hands the item back instead of blocking,
/// so callers decide what a full queue means.
///
/// The queue itself is not synchronized; the scheduler wraps each instance in
/// its own mutex.
///
/// # Example
///
/// ```rust
/// use job_scheduler::queue::BoundedQueue;
///
/// let mut queue = BoundedQueue::new(2);
/// queue.enqueue("a").unwrap();
/// queue.enqueue("b").unwrap();
///
/// // Queue is now full - the rejected item comes back
/// assert_eq!(queue.enqueue("c"), Err("c"));
///
/// assert_eq!(queue.peek(), Some(&"a"));
/// assert_eq!(queue.dequeue(), Some("a"));
/// ```
pub struct BoundedQueue<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    len: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a new bounded queue with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if no more items fit.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Appends an item at the tail, or returns it if the queue is full.
    pub fn enqueue(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the head item.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        item
    }

    /// Returns the head item without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Drops every queued item.
    pub fn clear(&mut self) {
        while self.dequeue().is_some() {}
        self.head = 0;
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .finish()
    }
}
