//! Simulation statistics collection and reporting.
//!
//! This module tracks the counters a run produces. It provides:
//! 1. **Cycles:** The elapsed span between the first and last driver invocation.
//! 2. **Branch prediction:** Branches, BTB misses, mispredictions and the cycles they cost.
//! 3. **Cache hierarchy:** Hit/miss counts for L1 and L2, and write-backs.
//! 4. **Prefetching:** Issued and used prefetches, and cycles spent waiting on them.
//!
//! Ratios are derived on demand and are `None` when their denominator is zero.

use std::fmt;

use serde::Serialize;

use crate::core::units::cache::MemoryStats;

/// Counters gathered over one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Trace records consumed.
    pub instructions: u64,
    /// Branch instructions seen.
    pub branches: u64,
    /// Branches not found in the BTB.
    pub btb_misses: u64,
    /// Conditional branches whose direction was mispredicted.
    pub mispredictions: u64,
    /// Cycles charged for BTB misses and mispredictions.
    pub branch_penalty_cycles: u64,
    /// Driver invocations spent waiting for a fetch stall to end.
    pub stall_ticks: u64,

    /// L1 hits.
    pub l1_hits: u64,
    /// L1 misses.
    pub l1_misses: u64,
    /// Demand L2 hits.
    pub l2_hits: u64,
    /// Demand L2 misses.
    pub l2_misses: u64,
    /// Dirty blocks written back.
    pub writebacks: u64,

    /// Prefetches installed in L2.
    pub total_prefetches: u64,
    /// Prefetched blocks later demanded.
    pub used_prefetches: u64,
    /// Cycles demand accesses waited on in-flight prefetches.
    pub prefetch_wait_cycles: u64,

    /// Global cycle when the run started.
    pub begin_cycle: u64,
    /// Global cycle when the run ended.
    pub end_cycle: u64,
}

#[inline]
fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

impl SimStats {
    /// Copies the memory hierarchy counters.
    pub const fn record_memory(&mut self, memory: &MemoryStats) {
        self.l1_hits = memory.l1_hits;
        self.l1_misses = memory.l1_misses;
        self.l2_hits = memory.l2_hits;
        self.l2_misses = memory.l2_misses;
        self.writebacks = memory.writebacks;
        self.total_prefetches = memory.total_prefetches;
        self.used_prefetches = memory.used_prefetches;
        self.prefetch_wait_cycles = memory.prefetch_wait_cycles;
    }

    /// Elapsed cycles, `end_cycle - begin_cycle`.
    pub const fn cycles(&self) -> u64 {
        self.end_cycle.saturating_sub(self.begin_cycle)
    }

    /// Instructions per cycle.
    pub fn ipc(&self) -> Option<f64> {
        ratio(self.instructions, self.cycles())
    }

    /// Fraction of branches found in the BTB.
    pub fn btb_hit_rate(&self) -> Option<f64> {
        ratio(self.branches.saturating_sub(self.btb_misses), self.branches)
    }

    /// Fraction of branches whose direction was predicted correctly.
    pub fn prediction_accuracy(&self) -> Option<f64> {
        ratio(self.branches.saturating_sub(self.mispredictions), self.branches)
    }

    /// Fraction of L1 accesses that hit.
    pub fn l1_hit_rate(&self) -> Option<f64> {
        ratio(self.l1_hits, self.l1_hits + self.l1_misses)
    }

    /// Fraction of demand L2 accesses that hit.
    pub fn l2_hit_rate(&self) -> Option<f64> {
        ratio(self.l2_hits, self.l2_hits + self.l2_misses)
    }

    /// Fraction of issued prefetches that were used.
    pub fn prefetch_accuracy(&self) -> Option<f64> {
        ratio(self.used_prefetches, self.total_prefetches)
    }

    /// Prints the text report to stdout.
    pub fn print(&self) {
        print!("{self}");
    }
}

/// Formats a ratio as a percentage, or `n/a`.
struct Percent(Option<f64>);

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{:.2}%", value * 100.0),
            None => f.write_str("n/a"),
        }
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ipc = self
            .ipc()
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));

        writeln!(f, "==========================================================")?;
        writeln!(f, "MICROARCHITECTURE SIMULATION STATISTICS")?;
        writeln!(f, "==========================================================")?;
        writeln!(f, "sim_cycles               {}", self.cycles())?;
        writeln!(f, "sim_insts                {}", self.instructions)?;
        writeln!(f, "sim_ipc                  {ipc}")?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "BRANCH PREDICTION")?;
        writeln!(f, "  bp.branches            {}", self.branches)?;
        writeln!(f, "  bp.btb_misses          {}", self.btb_misses)?;
        writeln!(f, "  bp.btb_hit_rate        {}", Percent(self.btb_hit_rate()))?;
        writeln!(f, "  bp.mispredicts         {}", self.mispredictions)?;
        writeln!(f, "  bp.accuracy            {}", Percent(self.prediction_accuracy()))?;
        writeln!(f, "  bp.penalty_cycles      {}", self.branch_penalty_cycles)?;
        writeln!(f, "  bp.stall_ticks         {}", self.stall_ticks)?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "MEMORY HIERARCHY")?;
        writeln!(
            f,
            "  L1  accesses: {:<10} hits: {:<10} miss: {:<10} hit_rate: {}",
            self.l1_hits + self.l1_misses,
            self.l1_hits,
            self.l1_misses,
            Percent(self.l1_hit_rate())
        )?;
        writeln!(
            f,
            "  L2  accesses: {:<10} hits: {:<10} miss: {:<10} hit_rate: {}",
            self.l2_hits + self.l2_misses,
            self.l2_hits,
            self.l2_misses,
            Percent(self.l2_hit_rate())
        )?;
        writeln!(f, "  writebacks             {}", self.writebacks)?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "PREFETCHER")?;
        writeln!(f, "  pf.issued              {}", self.total_prefetches)?;
        writeln!(f, "  pf.used                {}", self.used_prefetches)?;
        writeln!(f, "  pf.accuracy            {}", Percent(self.prefetch_accuracy()))?;
        writeln!(f, "  pf.wait_cycles         {}", self.prefetch_wait_cycles)?;
        writeln!(f, "==========================================================")
    }
}
