//! Lossy bounded hand-off between pipeline threads
//!
//! Producers never wait: a push onto a full queue drops the new item and
//! leaves everything already queued untouched. Consumers never wait either:
//! popping an empty queue yields `None`. Ownership moves into the queue on
//! push and out to the popper on pop.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Fixed-capacity FIFO that drops on overflow
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    size_limit: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `size_limit` items
    pub fn new(size_limit: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(size_limit)),
            size_limit,
        }
    }

    /// Push `item` unless the queue is full.
    ///
    /// Returns `false` (and drops `item`) when the queue already holds
    /// `capacity()` items.
    pub fn try_push(&self, item: T) -> bool {
        let mut items = self.items.lock();
        if items.len() >= self.size_limit {
            return false;
        }
        items.push_back(item);
        true
    }

    /// Take the oldest queued item, if any
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    pub fn capacity(&self) -> usize {
        self.size_limit
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
