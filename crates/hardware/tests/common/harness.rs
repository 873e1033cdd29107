use uarchsim_core::config::Config;
use uarchsim_core::isa::InstructionRecord;
use uarchsim_core::sim::MemoryTrace;
use uarchsim_core::{Processor, SimContext, SimStats, Simulator};

use crate::common::init_tracing;

/// Drives a processor directly, one record per `step`.
pub struct Harness {
    pub ctx: SimContext,
    pub cpu: Processor,
    pub trace: MemoryTrace,
}

impl Harness {
    pub fn new(config: &Config, records: impl IntoIterator<Item = InstructionRecord>) -> Self {
        init_tracing();
        Self {
            ctx: SimContext::new(),
            cpu: Processor::new(config).unwrap(),
            trace: MemoryTrace::new(records),
        }
    }

    /// Runs one driver invocation and returns the cycles it added.
    pub fn step(&mut self) -> u64 {
        let before = self.ctx.read();
        assert!(self.cpu.clock(&mut self.ctx, &mut self.trace).unwrap());
        self.ctx.read() - before
    }

    /// Runs driver invocations until the trace is exhausted.
    pub fn drain(&mut self) {
        while self.cpu.clock(&mut self.ctx, &mut self.trace).unwrap() {}
    }

    pub fn stats(&self) -> SimStats {
        self.cpu.stats()
    }
}

/// Runs `records` through a fresh simulator.
pub fn run(config: &Config, records: impl IntoIterator<Item = InstructionRecord>) -> SimStats {
    init_tracing();
    let mut sim = Simulator::new(config).unwrap();
    sim.run(&mut MemoryTrace::new(records)).unwrap()
}
