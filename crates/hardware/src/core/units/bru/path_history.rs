//! Path history register.
//!
//! A bounded record of recent branch target addresses, most recent first.
//! When a push overflows the capacity, the second-oldest entry is dropped
//! rather than the oldest, so the window keeps a stable stride-2 sampling of
//! older history while the head always holds the newest targets.

use std::collections::VecDeque;

/// Bounded branch-target history.
#[derive(Debug, Clone)]
pub struct PathHistory {
    entries: VecDeque<u64>,
    capacity: usize,
}

impl PathHistory {
    /// Creates an empty history holding at most `capacity` targets.
    ///
    /// Capacities below 2 are raised to 2 so the overflow rule always has a
    /// second-oldest entry to drop.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Records a new target as the most recent entry.
    pub fn push(&mut self, target: u64) {
        self.entries.push_front(target);
        let len = self.entries.len();
        if len > self.capacity {
            let _ = self.entries.remove(len - 2);
        }
    }

    /// Returns the `age`-th most recent target (0 = newest), or 0 if the
    /// history is not that deep yet.
    #[inline]
    pub fn get(&self, age: usize) -> u64 {
        self.entries.get(age).copied().unwrap_or(0)
    }

    /// Number of recorded targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no target has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of targets retained.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Targets from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().copied()
    }
}
