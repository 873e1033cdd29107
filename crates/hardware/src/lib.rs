//! Trace-driven microarchitecture simulator library.
//!
//! This crate models the branch-prediction and memory-hierarchy subsystems of
//! a CPU core against a recorded instruction trace, accumulating a synthetic
//! cycle count and hit/miss statistics:
//! 1. **Indexer:** One set-associative table shared by every hardware structure.
//! 2. **Front end:** Branch Target Buffer with none, last-outcome or gshare/path direction prediction.
//! 3. **Memory:** Write-back L1/L2 caches with a signature or stride prefetcher on L2.
//! 4. **Simulation:** Per-instruction driver, run loop, trace sources, configuration and statistics.
//!
//! # Examples
//!
//! ```
//! use uarchsim_core::isa::{BranchKind, InstructionRecord};
//! use uarchsim_core::sim::MemoryTrace;
//! use uarchsim_core::{Config, Simulator};
//!
//! let mut sim = Simulator::new(&Config::default()).unwrap();
//! let mut trace = MemoryTrace::new([
//!     InstructionRecord::load(0x400, 4, 0x1000),
//!     InstructionRecord::branch(0x404, 4, BranchKind::Conditional),
//!     InstructionRecord::other(0x408, 4),
//! ]);
//!
//! let stats = sim.run(&mut trace).unwrap();
//! assert_eq!(stats.instructions, 3);
//! assert_eq!(stats.l1_misses, 1);
//! assert_eq!(stats.btb_misses, 1);
//! assert_eq!(stats.mispredictions, 1);
//! ```

/// Common types and constants (hardware constants, error types).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Simulation context and hardware units (indexer, BTB, caches, prefetchers).
pub mod core;
/// Instruction trace records.
pub mod isa;
/// Driver, run loop and trace sources.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Global cycle counter passed into every core operation.
pub use crate::core::SimContext;
/// Per-instruction driver owning the branch unit and caches.
pub use crate::sim::Processor;
/// Run loop owning the context and the processor.
pub use crate::sim::Simulator;
/// Counters produced by a run.
pub use crate::stats::SimStats;
