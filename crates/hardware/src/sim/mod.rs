//! Simulation driver, run loop and trace sources.
//!
//! The [`Processor`] consumes one trace record per invocation of its clock;
//! the [`Simulator`] owns the context and loops until the trace ends.

/// Per-instruction driver.
pub mod processor;

/// Top-level run loop.
pub mod simulator;

/// Instruction trace sources.
pub mod trace;

pub use self::processor::Processor;
pub use self::simulator::Simulator;
pub use self::trace::{JsonLinesTrace, MemoryTrace, TraceSource};
