//! L1/L2 Memory Hierarchy.
//!
//! Timing is accumulated directly on the simulation context:
//!
//! 1. **Reads:** `get_l1` charges the L1 lookup; an L1 miss fills from L2,
//!    writing back a dirty victim first.
//! 2. **L2:** demand accesses charge the L2 lookup, wait for in-flight
//!    prefetches, and charge the memory penalty on a miss. Every demand access
//!    then trains the prefetcher and issues its requests as L2 installs with a
//!    future ready time.
//! 3. **Writes:** `put_l1` reads for ownership, dirties the L1 copy and drops
//!    the L2 copy, so a block is only ever dirty in one level.
//!
//! Every dirty, valid victim at either level is counted and charged once
//! before the replacing block is installed.

use serde::Serialize;

use super::{Cache, CacheLine};
use crate::common::error::ConfigError;
use crate::config::{CacheHierarchyConfig, PrefetchConfig};
use crate::core::SimContext;
use crate::core::units::assoc::Slot;
use crate::core::units::prefetch::Prefetcher;

/// Kind of L2 access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L2Request {
    /// Demand access from an L1 miss.
    Demand,
    /// Prefetch install completing at cycle `ready`.
    Prefetch {
        /// Cycle at which the block becomes usable.
        ready: u64,
    },
}

/// Memory hierarchy counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// L1 hits.
    pub l1_hits: u64,
    /// L1 misses.
    pub l1_misses: u64,
    /// Demand L2 hits.
    pub l2_hits: u64,
    /// Demand L2 misses.
    pub l2_misses: u64,
    /// Dirty victims written back, at either level.
    pub writebacks: u64,
    /// Prefetches installed in L2.
    pub total_prefetches: u64,
    /// Prefetched blocks later hit by a demand access.
    pub used_prefetches: u64,
    /// Cycles demand accesses spent waiting for prefetches to arrive.
    pub prefetch_wait_cycles: u64,
}

impl MemoryStats {
    /// Share of issued prefetches that were used, in whole percent.
    ///
    /// Zero while no prefetch has been issued.
    pub const fn prefetch_accuracy_pct(&self) -> u64 {
        if self.total_prefetches == 0 {
            0
        } else {
            self.used_prefetches * 100 / self.total_prefetches
        }
    }
}

/// Two cache levels and the L2 prefetcher.
#[derive(Debug, Clone)]
pub struct MemoryHierarchy {
    l1: Cache,
    l2: Cache,
    prefetcher: Prefetcher,
    miss_penalty: u64,
    writeback_penalty: u64,
    stats: MemoryStats,
}

impl MemoryHierarchy {
    /// Builds empty caches and the configured prefetcher.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any table geometry that cannot be
    /// indexed with a bitmask, or a block size that is not a power of two.
    pub fn new(cache: &CacheHierarchyConfig, prefetch: &PrefetchConfig) -> Result<Self, ConfigError> {
        let l1 = Cache::new("l1", &cache.l1, cache.line_bytes)?;
        let l2 = Cache::new("l2", &cache.l2, cache.line_bytes)?;
        tracing::debug!(
            l1_lines = cache.l1.lines,
            l2_lines = cache.l2.lines,
            line_bytes = cache.line_bytes,
            prefetcher = ?prefetch.algorithm,
            "memory hierarchy allocated"
        );
        Ok(Self {
            l1,
            l2,
            prefetcher: Prefetcher::new(prefetch, cache.line_bytes.trailing_zeros())?,
            miss_penalty: cache.miss_penalty,
            writeback_penalty: cache.writeback_penalty,
            stats: MemoryStats::default(),
        })
    }

    /// Reads `addr` through L1. Returns `true` on an L1 hit.
    pub fn get_l1(&mut self, ctx: &mut SimContext, pc: u64, addr: u64) -> bool {
        self.fill_l1(ctx, pc, addr).1
    }

    /// Writes `addr`: read for ownership, then dirty the L1 line and drop
    /// any L2 copy. Returns `true` on an L1 hit.
    pub fn put_l1(&mut self, ctx: &mut SimContext, pc: u64, addr: u64) -> bool {
        let (slot, hit) = self.fill_l1(ctx, pc, addr);
        self.l1.line_mut(slot).dirty = true;
        if let Some(l2_slot) = self.l2.lookup(addr) {
            *self.l2.line_mut(l2_slot) = CacheLine::default();
        }
        hit
    }

    /// Accesses L2. Returns `true` if the block was already present.
    ///
    /// A prefetch request for a block that is already valid is backed out
    /// of the prefetch total.
    pub fn get_l2(&mut self, ctx: &mut SimContext, pc: u64, addr: u64, request: L2Request) -> bool {
        match request {
            L2Request::Demand => {
                let hit = self.demand_l2(ctx, addr);
                self.trigger_prefetch(ctx, pc, addr);
                hit
            }
            L2Request::Prefetch { ready } => {
                if self.l2.contains(addr) {
                    self.stats.total_prefetches = self.stats.total_prefetches.saturating_sub(1);
                    return true;
                }
                let slot = self.evict_l2(ctx, addr);
                let block = self.l2.block(addr);
                let line = self.l2.line_mut(slot);
                *line = CacheLine::filled(block, ctx.read());
                line.prefetched = true;
                line.ready = ready;
                false
            }
        }
    }

    /// Counters accumulated so far.
    pub const fn stats(&self) -> &MemoryStats {
        &self.stats
    }

    /// L1 cache.
    pub const fn l1(&self) -> &Cache {
        &self.l1
    }

    /// L2 cache.
    pub const fn l2(&self) -> &Cache {
        &self.l2
    }

    /// Attached prefetcher.
    pub const fn prefetcher(&self) -> &Prefetcher {
        &self.prefetcher
    }

    fn fill_l1(&mut self, ctx: &mut SimContext, pc: u64, addr: u64) -> (Slot, bool) {
        ctx.advance(self.l1.latency());

        if let Some(slot) = self.l1.lookup(addr) {
            self.stats.l1_hits += 1;
            self.l1.line_mut(slot).clock = ctx.read();
            return (slot, true);
        }

        self.stats.l1_misses += 1;
        let slot = self.l1.victim(addr);
        let victim = *self.l1.line(slot);
        if victim.valid && victim.dirty {
            let victim_addr = self.l1.block_addr(victim.tag);
            self.write_back(ctx, victim_addr);
            self.absorb_into_l2(ctx, victim_addr);
        }

        let _ = self.get_l2(ctx, pc, addr, L2Request::Demand);
        *self.l1.line_mut(slot) = CacheLine::filled(self.l1.block(addr), ctx.read());
        (slot, false)
    }

    fn demand_l2(&mut self, ctx: &mut SimContext, addr: u64) -> bool {
        ctx.advance(self.l2.latency());

        if let Some(slot) = self.l2.lookup(addr) {
            self.stats.l2_hits += 1;
            let now = ctx.read();
            let line = self.l2.line_mut(slot);
            line.clock = now;
            if line.prefetched {
                line.prefetched = false;
                let wait = line.ready.saturating_sub(now);
                self.stats.used_prefetches += 1;
                if wait > 0 {
                    self.stats.prefetch_wait_cycles = self.stats.prefetch_wait_cycles.saturating_add(wait);
                    ctx.advance(wait);
                    tracing::trace!(addr = %format_args!("{addr:#x}"), wait, "waiting on prefetch");
                }
            }
            return true;
        }

        self.stats.l2_misses += 1;
        ctx.advance(self.miss_penalty);
        let slot = self.evict_l2(ctx, addr);
        *self.l2.line_mut(slot) = CacheLine::filled(self.l2.block(addr), ctx.read());
        false
    }

    /// Takes a dirty L1 victim into L2.
    fn absorb_into_l2(&mut self, ctx: &mut SimContext, addr: u64) {
        let slot = match self.l2.lookup(addr) {
            Some(slot) => slot,
            None => {
                let slot = self.evict_l2(ctx, addr);
                *self.l2.line_mut(slot) = CacheLine::filled(self.l2.block(addr), ctx.read());
                slot
            }
        };
        let line = self.l2.line_mut(slot);
        line.dirty = true;
        line.clock = ctx.read();
    }

    /// Frees the L2 line a fill of `addr` will use, writing back its block
    /// if it is dirty.
    fn evict_l2(&mut self, ctx: &mut SimContext, addr: u64) -> Slot {
        let slot = self.l2.victim(addr);
        let victim = *self.l2.line(slot);
        if victim.valid && victim.dirty {
            let victim_addr = self.l2.block_addr(victim.tag);
            self.write_back(ctx, victim_addr);
        }
        slot
    }

    fn write_back(&mut self, ctx: &mut SimContext, addr: u64) {
        self.stats.writebacks += 1;
        ctx.advance(self.writeback_penalty);
        tracing::trace!(addr = %format_args!("{addr:#x}"), cycle = ctx.read(), "write-back");
    }

    fn trigger_prefetch(&mut self, ctx: &mut SimContext, pc: u64, addr: u64) {
        let accuracy = self.stats.prefetch_accuracy_pct();
        let requests = self.prefetcher.observe(ctx.read(), pc, addr, accuracy);
        for request in requests {
            self.stats.total_prefetches += 1;
            tracing::trace!(
                pc = %format_args!("{pc:#x}"),
                addr = %format_args!("{:#x}", request.addr),
                ready = request.ready,
                level = ?request.level,
                "prefetch issued"
            );
            let _ = self.get_l2(ctx, pc, request.addr, L2Request::Prefetch { ready: request.ready });
        }
    }
}
