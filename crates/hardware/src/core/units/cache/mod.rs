//! Set-Associative Cache Model.
//!
//! This module implements one level of a write-back, set-associative cache
//! on top of the shared associative table. A [`Cache`] only knows how to find,
//! evict and install blocks; the policy tying two levels together (fills,
//! write-backs, prefetch installs) lives in [`hierarchy`].

/// Two-level L1/L2 hierarchy with an attached prefetcher.
pub mod hierarchy;

pub use self::hierarchy::{L2Request, MemoryHierarchy, MemoryStats};

use crate::common::error::ConfigError;
use crate::config::CacheConfig;
use crate::core::units::assoc::{AssocTable, Geometry, Slot, TableLine};

/// Cache line metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Block address held by the line.
    pub tag: u64,
    /// Cycle of the last access, for LRU replacement.
    pub clock: u64,
    /// Whether the line holds a block.
    pub valid: bool,
    /// Whether the block was written since it was filled.
    pub dirty: bool,
    /// Installed by the prefetcher and not yet demanded.
    pub prefetched: bool,
    /// Cycle at which a prefetched block arrives.
    pub ready: u64,
}

impl CacheLine {
    /// A freshly filled, clean line.
    pub const fn filled(block: u64, now: u64) -> Self {
        Self {
            tag: block,
            clock: now,
            valid: true,
            dirty: false,
            prefetched: false,
            ready: 0,
        }
    }
}

impl TableLine for CacheLine {
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

/// One cache level.
#[derive(Debug, Clone)]
pub struct Cache {
    table: AssocTable<CacheLine>,
    latency: u64,
    block_shift: u32,
}

impl Cache {
    /// Creates an empty cache.
    ///
    /// `line_bytes` must already be known to be a power of two.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if the set count is not a
    /// power of two.
    pub fn new(name: &'static str, config: &CacheConfig, line_bytes: usize) -> Result<Self, ConfigError> {
        if !line_bytes.is_power_of_two() {
            return Err(ConfigError::InvalidLineSize(line_bytes));
        }
        Ok(Self {
            table: AssocTable::new(Geometry::new(name, config.lines, config.ways)?),
            latency: config.latency,
            block_shift: line_bytes.trailing_zeros(),
        })
    }

    /// Block address of `addr`.
    #[inline(always)]
    pub const fn block(&self, addr: u64) -> u64 {
        addr >> self.block_shift
    }

    /// First byte address of `block`.
    #[inline(always)]
    pub const fn block_addr(&self, block: u64) -> u64 {
        block << self.block_shift
    }

    /// Lookup cost in cycles.
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// Finds the valid line holding `addr`.
    pub fn lookup(&self, addr: u64) -> Option<Slot> {
        let block = self.block(addr);
        self.table.lookup(block, block)
    }

    /// Whether `addr` is held by a valid line.
    pub fn contains(&self, addr: u64) -> bool {
        self.lookup(addr).is_some()
    }

    /// Line that a fill of `addr` would replace.
    pub fn victim(&self, addr: u64) -> Slot {
        self.table.victim(self.block(addr))
    }

    /// Line at `slot`.
    pub fn line(&self, slot: Slot) -> &CacheLine {
        self.table.line(slot)
    }

    /// Line at `slot`, mutably.
    pub fn line_mut(&mut self, slot: Slot) -> &mut CacheLine {
        self.table.line_mut(slot)
    }

    /// Number of valid lines.
    pub fn occupancy(&self) -> usize {
        self.table.iter().filter(|line| line.valid).count()
    }
}
