//! Hardware Prefetcher implementations.
//!
//! Prefetchers observe demand accesses reaching the L2 and return blocks to
//! install ahead of use. Each request carries the cycle at which its data
//! arrives; a demand access that hits the block earlier waits for the
//! remainder.

/// Signature-correlated prefetcher with one level of look-ahead.
pub mod signature;

/// Per-PC stride prefetcher.
pub mod stride;

pub use self::signature::SignaturePrefetcher;
pub use self::stride::StridePrefetcher;

use crate::common::constants::{LOOKAHEAD_HORIZON, MEMORY_PENALTY};
use crate::common::error::ConfigError;
use crate::config::{PrefetchConfig, PrefetcherMode};

/// Distance of a prefetch from the access that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchLevel {
    /// Next predicted block.
    Prefetch,
    /// Block predicted from the predicted block.
    LookAhead,
}

impl PrefetchLevel {
    /// Minimum confidence, in percent, required to issue at this level.
    pub const fn threshold(self) -> u64 {
        match self {
            Self::Prefetch => 50,
            Self::LookAhead => 75,
        }
    }

    /// Cycles until a block requested at this level arrives.
    pub const fn horizon(self) -> u64 {
        match self {
            Self::Prefetch => MEMORY_PENALTY,
            Self::LookAhead => LOOKAHEAD_HORIZON,
        }
    }
}

/// A block to install in L2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchRequest {
    /// Byte address of the block.
    pub addr: u64,
    /// Cycle at which the block arrives.
    pub ready: u64,
    /// Level that produced the request.
    pub level: PrefetchLevel,
}

impl PrefetchRequest {
    /// A request issued at cycle `now`.
    pub const fn new(addr: u64, now: u64, level: PrefetchLevel) -> Self {
        Self {
            addr,
            ready: now.saturating_add(level.horizon()),
            level,
        }
    }
}

/// Prefetcher attached to the L2, selected at construction.
#[derive(Debug, Clone)]
pub enum Prefetcher {
    /// Never prefetches.
    None,
    /// Stride detector.
    Stride(StridePrefetcher),
    /// Signature prefetcher.
    Signature(Box<SignaturePrefetcher>),
}

impl Prefetcher {
    /// Builds the configured prefetcher for blocks of `1 << block_shift` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if a prefetcher table cannot
    /// be indexed with a bitmask.
    pub fn new(config: &PrefetchConfig, block_shift: u32) -> Result<Self, ConfigError> {
        Ok(match config.algorithm {
            PrefetcherMode::None => Self::None,
            PrefetcherMode::Stride => Self::Stride(StridePrefetcher::new(
                config.stride_lines,
                config.stride_ways,
                config.degree,
            )?),
            PrefetcherMode::Signature => {
                Self::Signature(Box::new(SignaturePrefetcher::new(block_shift)?))
            }
        })
    }

    /// Observes a demand access by `pc` to `addr` at cycle `now`.
    ///
    /// `accuracy_pct` is the share of issued prefetches used so far; the
    /// signature prefetcher scales its look-ahead confidence by it.
    pub fn observe(&mut self, now: u64, pc: u64, addr: u64, accuracy_pct: u64) -> Vec<PrefetchRequest> {
        match self {
            Self::None => Vec::new(),
            Self::Stride(p) => p.observe(now, pc, addr).into_iter().collect(),
            Self::Signature(p) => p.observe(now, pc, addr, accuracy_pct),
        }
    }
}
