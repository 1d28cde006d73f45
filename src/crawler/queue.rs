//! Shared work queue and result sink used by the worker pools
//!
//! Both are plain mutex-guarded collections. Workers take one item at a time
//! and never hold a lock while doing network I/O.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO of pending work items shared by all workers of a pool
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Takes the next item; `None` once the queue is drained
    pub fn pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn push(&self, item: T) {
        self.lock().push_back(item);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panicking worker never leaves the deque half-updated, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for WorkQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}

/// Append-only collection of results produced by concurrent workers
#[derive(Debug)]
pub struct Sink<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Sink<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, item: T) {
        self.lock().push(item);
    }

    /// Moves a whole batch in under a single lock
    pub fn append(&self, mut batch: Vec<T>) {
        self.lock().append(&mut batch);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Sink<T> {
    fn default() -> Self {
        Self::new()
    }
}
