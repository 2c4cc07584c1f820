//! Fixed-capacity FIFO of the most recent instances of one class.

use std::collections::VecDeque;

use crate::schema::Instance;

/// Slots reserved up front; larger windows grow on demand.
const RESERVE: usize = 1024;

/// Sliding window holding at most `capacity` instances, newest at the back.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    items: VecDeque<Instance>,
}

impl SlidingWindow {
    /// `capacity` below 1 is raised to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity.min(RESERVE) + 1),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Append `instance`; returns the evicted oldest instance on overflow.
    pub fn push(&mut self, instance: Instance) -> Option<Instance> {
        self.items.push_back(instance);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    /// Instance at `idx`, oldest first.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Instance> {
        self.items.get(idx)
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.items.iter()
    }

    /// Remove every instance, newest first.
    pub fn drain_newest_first(&mut self) -> impl Iterator<Item = Instance> + '_ {
        self.items.drain(..).rev()
    }
}
