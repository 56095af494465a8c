use std::{collections::VecDeque, hash::Hash};

use hashbrown::HashSet;

/// FIFO work-list that enqueues every item at most once.
///
/// Termination of every traversal built on this follows from the finite
/// universe of items it is fed.
#[derive(Debug)]
pub struct Worklist<T> {
    queue: VecDeque<T>,
    seen: HashSet<T>,
}

impl<T> Default for Worklist<T> {
    #[inline]
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> Worklist<T> {
    pub fn new<I: IntoIterator<Item = T>>(it: I) -> Self {
        let mut me = Self::default();
        me.extend(it);
        me
    }

    /// Returns true if the item had not been seen before
    pub fn push(&mut self, item: T) -> bool {
        if self.seen.insert(item.clone()) {
            self.queue.push_back(item);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> { self.queue.pop_front() }

    /// Drain the queue, feeding each item's successors back in, and return
    /// everything that was ever enqueued
    pub fn solve<I: IntoIterator<Item = T>>(mut self, mut f: impl FnMut(&T) -> I) -> HashSet<T> {
        while let Some(item) = self.pop() {
            self.extend(f(&item));
        }

        self.seen
    }
}

impl<T: Clone + Eq + Hash> Extend<T> for Worklist<T> {
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, it: I) {
        for item in it {
            self.push(item);
        }
    }
}
