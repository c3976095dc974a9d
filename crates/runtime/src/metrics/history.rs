//! Bounded, chronologically ordered snapshot history.

use std::collections::VecDeque;

use super::TickSnapshot;

/// Number of snapshots retained by default.
pub const HISTORY_CAPACITY: usize = 1000;

/// Fixed-capacity FIFO of snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    entries: VecDeque<TickSnapshot>,
    capacity: usize,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Creates a history holding at most `capacity` snapshots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a snapshot, returning the evicted oldest entry when full.
    pub fn push(&mut self, snapshot: TickSnapshot) -> Option<TickSnapshot> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(snapshot);
        evicted
    }

    pub fn latest(&self) -> Option<&TickSnapshot> {
        self.entries.back()
    }

    /// Iterates the `n` most recent snapshots, oldest first.
    pub fn iter_recent(&self, n: usize) -> impl Iterator<Item = &TickSnapshot> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    /// Copies out up to `n` most recent snapshots, oldest first.
    pub fn recent(&self, n: usize) -> Vec<TickSnapshot> {
        self.iter_recent(n).cloned().collect()
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

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new()
    }
}
