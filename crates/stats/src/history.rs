//! Bounded FIFO history of recent events
//!
//! Holds the last N events in arrival order. Pushing into a full buffer
//! evicts the oldest entry first.

use std::collections::VecDeque;

use parking_lot::Mutex;

use jtail_protocol::Event;

/// Largest history a buffer will hold
pub const MAX_HISTORY_CAPACITY: usize = 100_000;

/// Fixed-capacity event history
///
/// Reads and writes are mutually exclusive: a copy never observes the buffer
/// mid-eviction.
#[derive(Debug)]
pub struct HistoryBuffer {
    /// Events, oldest at the front
    inner: Mutex<VecDeque<Event>>,
    /// Capacity, fixed at construction
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a history buffer holding at most `capacity` events
    ///
    /// Capacity is clamped to `1..=MAX_HISTORY_CAPACITY`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_CAPACITY);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event, evicting the oldest if full
    pub fn push(&self, event: Event) {
        let mut inner = self.inner.lock();
        if inner.len() >= self.capacity {
            inner.pop_front();
        }
        inner.push_back(event);
    }

    /// Copy of all events, oldest first
    pub fn to_vec(&self) -> Vec<Event> {
        self.inner.lock().iter().cloned().collect()
    }

    /// Current fill level
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Configured capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all events
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
