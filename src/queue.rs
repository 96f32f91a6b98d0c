//! Pending Queue: local operations waiting behind the in-flight one
//!
//! Entries are kept in generation order (front = oldest = next to send) and
//! in sequential form: each entry applies to the document produced by the
//! entries before it.
//!
//! When a remote operation arrives the whole queue is rewritten in a single
//! oldest-to-newest pass. An entry may come out of that pass unchanged,
//! shifted, split in two, or gone, so the pass rebuilds the queue rather than
//! patching it in place.

use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ordered buffer of unsent local operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQueue {
    entries: VecDeque<Operation>,
}

impl PendingQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append a newly generated local operation
    pub fn push_back(&mut self, op: Operation) {
        self.entries.push_back(op);
    }

    /// Remove the oldest operation (the next one to send)
    pub fn pop_front(&mut self) -> Option<Operation> {
        self.entries.pop_front()
    }

    /// Peek at the oldest operation
    pub fn front(&self) -> Option<&Operation> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.entries.iter()
    }

    /// Rewrite every entry, oldest to newest
    ///
    /// `replace` is called once per entry, in generation order, and the entry
    /// is replaced by whatever it yields: nothing removes it, one operation
    /// updates it, several operations take its place in the yielded order.
    /// Relative order of the surrounding entries is preserved.
    ///
    /// The closure may carry state from one entry to the next.
    ///
    /// # Example
    ///
    /// ```rust
    /// use notesync_core::{transform, Operation, PendingQueue};
    ///
    /// let mut queue = PendingQueue::new();
    /// queue.push_back(Operation::delete("Hello World", 0, 0, "alice".to_string()));
    ///
    /// let remote = Operation::insert("XX", 5, 1, "bob".to_string());
    /// queue.transform_each(|op| transform(op, &remote).into_sequential());
    ///
    /// assert_eq!(queue.len(), 2);
    /// ```
    pub fn transform_each<F, I>(&mut self, mut replace: F)
    where
        F: FnMut(&Operation) -> I,
        I: IntoIterator<Item = Operation>,
    {
        let mut rewritten = VecDeque::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            rewritten.extend(replace(entry));
        }
        self.entries = rewritten;
    }
}

impl<'a> IntoIterator for &'a PendingQueue {
    type Item = &'a Operation;
    type IntoIter = std::collections::vec_deque::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Operation> for PendingQueue {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
