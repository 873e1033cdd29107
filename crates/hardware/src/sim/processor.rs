//! Simulation driver.
//!
//! Each call to [`Processor::clock`] consumes at most one trace record and
//! finishes every side effect before returning:
//!
//! 1. **Resolve:** the branch fetched by the previous call learns its outcome
//!    from this record's address and trains the predictor.
//! 2. **Branch:** a branch record is looked up in the BTB and predicted; the
//!    prediction waits for the next record.
//! 3. **Memory:** the first and second read operands go through `get_l1`,
//!    then the write operand through `put_l1`.
//!
//! Branch penalties either advance the cycle counter directly or, under the
//! fetch-stall model, block the next fetch until the counter has caught up.

use crate::common::error::{ConfigError, SimError};
use crate::config::{Config, PenaltyModel};
use crate::core::SimContext;
use crate::core::units::bru::{BranchUnit, PendingBranch};
use crate::core::units::cache::MemoryHierarchy;
use crate::sim::trace::TraceSource;
use crate::stats::SimStats;

/// Trace-driven model of the branch unit and memory hierarchy.
#[derive(Debug, Clone)]
pub struct Processor {
    branch: BranchUnit,
    memory: MemoryHierarchy,
    btb_penalty: u64,
    mispredict_penalty: u64,
    penalty_model: PenaltyModel,
    /// Branch waiting for the next record to resolve it.
    pending: Option<PendingBranch>,
    /// First cycle at which fetch may resume.
    fetch_resume: u64,
    stats: SimStats,
}

impl Processor {
    /// Builds every table described by `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` does not validate.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let branch = BranchUnit::new(&config.branch)?;
        let memory = MemoryHierarchy::new(&config.cache, &config.prefetch)?;
        tracing::debug!(
            predictor = ?config.branch.predictor,
            btb_lines = config.branch.btb_lines,
            penalty_model = ?config.branch.penalty_model,
            "processor allocated"
        );
        Ok(Self {
            branch,
            memory,
            btb_penalty: config.branch.btb_penalty,
            mispredict_penalty: config.branch.mispredict_penalty,
            penalty_model: config.branch.penalty_model,
            pending: None,
            fetch_resume: 0,
            stats: SimStats::default(),
        })
    }

    /// Processes at most one trace record.
    ///
    /// Returns `Ok(false)` once the trace is exhausted. While a fetch stall is
    /// in effect the call consumes nothing and counts one stall tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Trace`] if the trace source fails; the record is
    /// not processed.
    pub fn clock(&mut self, ctx: &mut SimContext, trace: &mut dyn TraceSource) -> Result<bool, SimError> {
        if ctx.read() < self.fetch_resume {
            self.stats.stall_ticks += 1;
            return Ok(true);
        }

        let Some(inst) = trace.next_instruction()? else {
            if let Some(pending) = self.pending.take() {
                tracing::trace!(pc = %format_args!("{:#x}", pending.address), "unresolved branch at end of trace");
            }
            return Ok(false);
        };
        self.stats.instructions += 1;

        if let Some(pending) = self.pending.take() {
            let pc = pending.address;
            let resolution = self.branch.resolve(pending, inst.address);
            if resolution.mispredicted {
                self.stats.mispredictions += 1;
                tracing::trace!(
                    pc = %format_args!("{pc:#x}"),
                    taken = resolution.taken,
                    cycle = ctx.read(),
                    "misprediction"
                );
                self.penalize(ctx, self.mispredict_penalty);
            }
        }

        if inst.is_branch() {
            self.stats.branches += 1;
            let pending = self.branch.lookup(&inst, ctx.read());
            if !pending.btb_hit {
                self.stats.btb_misses += 1;
                tracing::trace!(pc = %format_args!("{:#x}", inst.address), cycle = ctx.read(), "btb miss");
                self.penalize(ctx, self.btb_penalty);
            }
            self.pending = Some(pending);
        }

        for addr in [inst.read_address, inst.read2_address].into_iter().flatten() {
            let _ = self.memory.get_l1(ctx, inst.address, addr);
        }
        if let Some(addr) = inst.write_address {
            let _ = self.memory.put_l1(ctx, inst.address, addr);
        }

        Ok(true)
    }

    fn penalize(&mut self, ctx: &mut SimContext, cycles: u64) {
        self.stats.branch_penalty_cycles = self.stats.branch_penalty_cycles.saturating_add(cycles);
        match self.penalty_model {
            PenaltyModel::Charge => ctx.advance(cycles),
            PenaltyModel::FetchStall => {
                self.fetch_resume = self.fetch_resume.max(ctx.read().saturating_add(cycles));
            }
        }
    }

    /// Counters accumulated so far, without the begin/end cycles.
    pub fn stats(&self) -> SimStats {
        let mut stats = self.stats.clone();
        stats.record_memory(self.memory.stats());
        stats
    }

    /// Branch unit.
    pub const fn branch_unit(&self) -> &BranchUnit {
        &self.branch
    }

    /// Memory hierarchy.
    pub const fn memory(&self) -> &MemoryHierarchy {
        &self.memory
    }

    /// Branch waiting for resolution, if any.
    pub const fn pending_branch(&self) -> Option<&PendingBranch> {
        self.pending.as_ref()
    }

    /// First cycle at which fetch may resume.
    pub const fn fetch_resume(&self) -> u64 {
        self.fetch_resume
    }
}
