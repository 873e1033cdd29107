//! Core of the simulator.
//!
//! This module contains the simulation context that carries the global cycle
//! counter and the hardware units it drives: the associative table indexer,
//! the branch unit, the cache hierarchy and the prefetchers.

/// Simulation context (global cycle counter).
pub mod clock;

/// Hardware units (indexer, BTB and predictors, caches, prefetchers).
pub mod units;

pub use self::clock::SimContext;
