//! Associative Table Indexer.
//!
//! Every hardware table in the simulator (BTB, L1, L2, and the prefetcher
//! tables) is a fixed-capacity set-associative array. This module owns the
//! one copy of the addressing logic they share:
//!
//! 1. **Set selection:** `key & (sets - 1)`; set counts are validated to be
//!    powers of two when the geometry is built, so every set index and every
//!    line position derived from it is in bounds by construction.
//! 2. **Lookup:** the first valid line in the set whose tag matches.
//! 3. **Victim selection:** the first invalid line, otherwise the line with the
//!    smallest replacement stamp. Ties go to the lowest way, which keeps runs
//!    reproducible.
//!
//! What a "key", "tag" and "stamp" mean is up to each table: caches key on
//! the block address and stamp with the last-touch cycle; the pattern table
//! stamps with its confidence counter so the least-confident delta is evicted.

use crate::common::error::ConfigError;

/// A line stored in an [`AssocTable`].
pub trait TableLine: Clone + Default {
    /// Tag compared against lookups.
    fn tag(&self) -> u64;

    /// Whether the line holds live data.
    fn is_valid(&self) -> bool;

    /// Replacement stamp; among valid lines the smallest is evicted first.
    fn stamp(&self) -> u64;
}

/// Shape of a set-associative table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    sets: usize,
    ways: usize,
}

impl Geometry {
    /// Builds a geometry of `lines` total lines split into sets of `ways`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] when `ways` is zero, `lines` is
    /// not a multiple of `ways`, or the resulting set count is not a non-zero
    /// power of two.
    pub fn new(table: &'static str, lines: usize, ways: usize) -> Result<Self, ConfigError> {
        if ways == 0 || lines % ways != 0 || !(lines / ways).is_power_of_two() {
            return Err(ConfigError::InvalidGeometry { table, lines, ways });
        }
        Ok(Self {
            sets: lines / ways,
            ways,
        })
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Lines per set.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Total line count.
    pub const fn lines(&self) -> usize {
        self.sets * self.ways
    }

    /// Selects the set for `key`.
    #[inline(always)]
    pub const fn set_of(&self, key: u64) -> usize {
        (key & (self.sets as u64 - 1)) as usize
    }
}

/// Position of a line inside an [`AssocTable`].
///
/// Only the table hands these out, so a slot is always inside the table that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(usize);

impl Slot {
    /// Flat line index within the table.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Fixed-capacity set-associative table.
#[derive(Debug, Clone)]
pub struct AssocTable<L> {
    lines: Vec<L>,
    geometry: Geometry,
}

impl<L: TableLine> AssocTable<L> {
    /// Allocates a table with every line in its default (invalid) state.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            lines: vec![L::default(); geometry.lines()],
            geometry,
        }
    }

    /// Table shape.
    pub const fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Flat index of the first way of the set selected by `key`.
    #[inline(always)]
    const fn base(&self, key: u64) -> usize {
        self.geometry.set_of(key) * self.geometry.ways
    }

    /// Finds the valid line in `key`'s set carrying `tag`.
    #[inline]
    pub fn lookup(&self, key: u64, tag: u64) -> Option<Slot> {
        let base = self.base(key);
        self.lines[base..base + self.geometry.ways]
            .iter()
            .position(|line| line.is_valid() && line.tag() == tag)
            .map(|way| Slot(base + way))
    }

    /// Chooses the line to replace in `key`'s set.
    ///
    /// The first invalid way wins; otherwise the way with the strictly smallest
    /// stamp, scanning from way 0 so equal stamps resolve to the lowest way.
    #[inline]
    pub fn victim(&self, key: u64) -> Slot {
        let base = self.base(key);
        let mut best = base;
        let mut best_stamp = u64::MAX;
        for (way, line) in self.lines[base..base + self.geometry.ways].iter().enumerate() {
            if !line.is_valid() {
                return Slot(base + way);
            }
            if line.stamp() < best_stamp {
                best = base + way;
                best_stamp = line.stamp();
            }
        }
        Slot(best)
    }

    /// Returns the line at `slot`.
    #[inline(always)]
    pub fn line(&self, slot: Slot) -> &L {
        &self.lines[slot.0]
    }

    /// Returns the line at `slot` for modification.
    #[inline(always)]
    pub fn line_mut(&mut self, slot: Slot) -> &mut L {
        &mut self.lines[slot.0]
    }

    /// All ways of `key`'s set.
    pub fn set(&self, key: u64) -> &[L] {
        let base = self.base(key);
        &self.lines[base..base + self.geometry.ways]
    }

    /// All ways of `key`'s set, mutably.
    pub fn set_mut(&mut self, key: u64) -> &mut [L] {
        let base = self.base(key);
        let ways = self.geometry.ways;
        &mut self.lines[base..base + ways]
    }

    /// Iterates over every line in the table.
    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.lines.iter()
    }
}
