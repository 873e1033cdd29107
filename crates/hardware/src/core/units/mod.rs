//! Hardware units and their shared table machinery.
//!
//! Every unit here is built on the set-associative table in [`assoc`], which
//! owns set selection, lookup and victim selection for all of them.

/// Generic set-associative table (set selection, lookup, victim selection).
pub mod assoc;

/// Branch Resolution Unit: BTB and direction predictors.
pub mod bru;

/// L1/L2 cache hierarchy.
pub mod cache;

/// Hardware prefetcher implementations (signature, stride).
pub mod prefetch;
