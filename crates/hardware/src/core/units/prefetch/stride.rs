//! Stride Prefetcher.
//!
//! A prefetcher that detects constant stride patterns per load/store PC. Each
//! PC moves through three states:
//!
//! - **Invalid:** (re)initialized on the next access; remembers the address.
//! - **Training:** becomes Active once the same stride is seen twice in a row,
//!   otherwise learns the new stride.
//! - **Active:** prefetches `addr + degree * stride` while the stride holds,
//!   otherwise falls back to Invalid.
//!
//! # Performance
//!
//! - **Time Complexity:** O(W) per access, W = table associativity
//! - **Space Complexity:** O(T) where T is the table size (typically 64-256 entries)
//! - **Hardware Cost:** Moderate - small table, simple arithmetic
//! - **Best Case:** Regular strided patterns (array traversals, matrix operations)
//! - **Worst Case:** Irregular or random access patterns (linked lists, hash tables)

use super::{PrefetchLevel, PrefetchRequest};
use crate::common::error::ConfigError;
use crate::core::units::assoc::{AssocTable, Geometry, TableLine};

/// Detection state of one PC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrideState {
    /// No history.
    #[default]
    Invalid,
    /// Stride seen once.
    Training,
    /// Stride confirmed; prefetching.
    Active,
}

/// Entry in the stride table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrideEntry {
    /// PC owning the entry.
    pub tag: u64,
    /// Cycle of the last access, for LRU replacement.
    pub clock: u64,
    /// Whether the entry is allocated.
    pub valid: bool,
    /// Detection state.
    pub state: StrideState,
    /// Last address accessed by the PC.
    pub last_addr: u64,
    /// Learned stride in bytes.
    pub stride: i64,
}

impl TableLine for StrideEntry {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn stamp(&self) -> u64 {
        self.clock
    }
}

/// Stride Prefetcher state.
#[derive(Debug, Clone)]
pub struct StridePrefetcher {
    table: AssocTable<StrideEntry>,
    /// Number of strides to prefetch ahead.
    degree: u64,
}

impl StridePrefetcher {
    /// Creates a stride prefetcher with a `lines`/`ways` table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if the table's set count is
    /// not a power of two.
    pub fn new(lines: usize, ways: usize, degree: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            table: AssocTable::new(Geometry::new("stride table", lines, ways)?),
            degree: degree.max(1),
        })
    }

    /// Observes an access by `pc` to `addr` and returns the block to
    /// prefetch, if any.
    pub fn observe(&mut self, now: u64, pc: u64, addr: u64) -> Option<PrefetchRequest> {
        let slot = match self.table.lookup(pc, pc) {
            Some(slot) => slot,
            None => {
                let slot = self.table.victim(pc);
                *self.table.line_mut(slot) = StrideEntry {
                    tag: pc,
                    valid: true,
                    ..StrideEntry::default()
                };
                slot
            }
        };

        let entry = self.table.line_mut(slot);
        entry.clock = now;
        let observed = addr.wrapping_sub(entry.last_addr) as i64;
        let mut request = None;

        match entry.state {
            StrideState::Invalid => {
                entry.state = StrideState::Training;
                entry.stride = 0;
            }
            StrideState::Training => {
                if observed == entry.stride {
                    entry.state = StrideState::Active;
                } else {
                    entry.stride = observed;
                }
            }
            StrideState::Active => {
                if observed == entry.stride && observed != 0 {
                    let target =
                        addr.wrapping_add_signed(observed.wrapping_mul(self.degree as i64));
                    request = Some(PrefetchRequest::new(target, now, PrefetchLevel::Prefetch));
                } else {
                    entry.state = StrideState::Invalid;
                }
            }
        }

        entry.last_addr = addr;
        request
    }

    /// Entry tracking `pc`, if allocated.
    pub fn entry(&self, pc: u64) -> Option<&StrideEntry> {
        self.table.lookup(pc, pc).map(|slot| self.table.line(slot))
    }
}
