//! Simulation context.
//!
//! Holds the global cycle counter that every component reads and advances.
//! One context is created per run, passed by mutable reference into each
//! core operation, and dropped when the run ends. Cycles are bookkeeping
//! only: advancing the counter models elapsed hardware time and never
//! yields control.

/// Per-run simulation context owning the global cycle counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimContext {
    cycle: u64,
}

impl SimContext {
    /// Creates a context at cycle 0.
    pub const fn new() -> Self {
        Self { cycle: 0 }
    }

    /// Returns the current global cycle.
    #[inline(always)]
    pub const fn read(&self) -> u64 {
        self.cycle
    }

    /// Advances the global cycle by `delta`.
    ///
    /// The counter saturates instead of wrapping so timestamps stay monotonic.
    #[inline(always)]
    pub const fn advance(&mut self, delta: u64) {
        self.cycle = self.cycle.saturating_add(delta);
    }
}
