use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Fixed-capacity, newest-first log buffer.
///
/// Pushing past capacity silently drops the oldest entries, so `len() <= capacity()`
/// holds after every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRingLog<T>")]
pub struct RingLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

/// Wire shape of a `RingLog` before the capacity is re-applied.
#[derive(Deserialize)]
struct RawRingLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> From<RawRingLog<T>> for RingLog<T> {
    fn from(raw: RawRingLog<T>) -> Self {
        let mut entries = raw.entries;
        entries.truncate(raw.capacity);
        Self {
            entries,
            capacity: raw.capacity,
        }
    }
}

impl<T> RingLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend `entry` and truncate to capacity.
    pub fn push(&mut self, entry: T) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Prepend a batch that arrived together. The batch keeps its own order
    /// at the head: `push_batch([a, b])` leaves `a` newest.
    pub fn push_batch(&mut self, batch: impl IntoIterator<Item = T>) {
        let batch: Vec<T> = batch.into_iter().collect();
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
