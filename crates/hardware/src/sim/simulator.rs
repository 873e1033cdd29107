//! Simulator: owns the simulation context and the processor side-by-side.
//!
//! The context lives outside the processor so every unit can borrow it
//! mutably while the processor itself is borrowed.

use crate::common::error::{ConfigError, SimError};
use crate::config::Config;
use crate::core::SimContext;
use crate::sim::processor::Processor;
use crate::sim::trace::TraceSource;
use crate::stats::SimStats;

/// Top-level simulator: context + processor.
#[derive(Debug, Clone)]
pub struct Simulator {
    /// Global cycle counter for this run.
    pub ctx: SimContext,
    /// Branch unit and memory hierarchy.
    pub processor: Processor,
}

impl Simulator {
    /// Creates a simulator at cycle 0.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` does not validate.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            ctx: SimContext::new(),
            processor: Processor::new(config)?,
        })
    }

    /// Runs `trace` to completion, one driver invocation per cycle.
    ///
    /// # Errors
    ///
    /// Returns the first [`SimError`] raised by the trace source; the run
    /// stops there.
    pub fn run(&mut self, trace: &mut dyn TraceSource) -> Result<SimStats, SimError> {
        let begin_cycle = self.ctx.read();
        loop {
            let more = self.processor.clock(&mut self.ctx, trace)?;
            self.ctx.advance(1);
            if !more {
                break;
            }
        }

        let mut stats = self.processor.stats();
        stats.begin_cycle = begin_cycle;
        stats.end_cycle = self.ctx.read();
        tracing::debug!(
            cycles = stats.cycles(),
            instructions = stats.instructions,
            "simulation finished"
        );
        Ok(stats)
    }
}
