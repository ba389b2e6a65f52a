//! Generational worklist for semi-naive fixpoints
//!
//! Items pushed while a generation is being processed land in the next
//! generation. Each generation holds an item at most once.

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Two-generation worklist with de-duplication.
#[derive(Debug, Clone)]
pub struct Worklist<T> {
    next: Vec<T>,
    queued: FxHashSet<T>,
}

impl<T: Copy + Eq + Hash> Worklist<T> {
    /// Create an empty worklist.
    pub fn new() -> Self {
        Self {
            next: Vec::new(),
            queued: FxHashSet::default(),
        }
    }

    /// Queue an item for the next generation.
    ///
    /// Returns false if it was already queued.
    pub fn push(&mut self, item: T) -> bool {
        if self.queued.insert(item) {
            self.next.push(item);
            true
        } else {
            false
        }
    }

    /// Take the pending generation, leaving the next one empty.
    ///
    /// Returns `None` once there is nothing left to process.
    pub fn advance(&mut self) -> Option<Vec<T>> {
        if self.next.is_empty() {
            return None;
        }
        self.queued.clear();
        Some(std::mem::take(&mut self.next))
    }

    /// Number of items waiting for the next generation.
    pub fn len(&self) -> usize {
        self.next.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.next.clear();
        self.queued.clear();
    }
}

impl<T: Copy + Eq + Hash> Default for Worklist<T> {
    fn default() -> Self {
        Self::new()
    }
}
