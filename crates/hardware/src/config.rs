//! Configuration system for the simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! a run. It provides:
//! 1. **Defaults:** The reference machine (512-entry BTB, 64 KiB L1, 1 MiB L2, 200-cycle memory).
//! 2. **Structures:** Hierarchical config for the branch unit, the cache hierarchy, and the prefetcher.
//! 3. **Enums:** Predictor, penalty, and prefetcher strategy selection.
//!
//! Configuration is supplied as JSON (any subset of fields) or built with `Config::default()`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::constants;
use crate::common::error::ConfigError;
use crate::core::units::assoc::Geometry;

/// Default configuration values.
///
/// Each entry mirrors a hardware constant in [`constants`]; the functions
/// exist so `#[serde(default = ...)]` can name them.
mod defaults {
    use crate::common::constants;

    pub const fn btb_lines() -> usize {
        constants::BTB_LINES
    }

    pub const fn btb_ways() -> usize {
        constants::BTB_WAYS
    }

    pub const fn btb_penalty() -> u64 {
        constants::BTB_PENALTY
    }

    pub const fn mispredict_penalty() -> u64 {
        constants::MISPREDICT_PENALTY
    }

    pub const fn tables() -> usize {
        constants::PRED_TABLES
    }

    pub const fn weights() -> usize {
        constants::PRED_WEIGHTS
    }

    pub const fn line_bytes() -> usize {
        constants::BLOCK_BYTES
    }

    pub const fn miss_penalty() -> u64 {
        constants::MEMORY_PENALTY
    }

    pub const fn writeback_penalty() -> u64 {
        constants::WRITEBACK_PENALTY
    }

    pub const fn degree() -> u64 {
        constants::STRIDE_DEGREE
    }

    pub const fn stride_lines() -> usize {
        constants::STRIDE_LINES
    }

    pub const fn stride_ways() -> usize {
        constants::STRIDE_WAYS
    }
}

/// Branch direction prediction strategy.
///
/// The three strategies correspond to successive generations of the same
/// front end; they share the BTB and differ only in where the direction
/// guess comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PredictorMode {
    /// Always predict taken; nothing is trained.
    None,
    /// One hint bit per BTB line holding the branch's last outcome.
    #[serde(alias = "OneBit")]
    LastOutcome,
    /// Weighted sum over global-history and path-indexed weight tables.
    #[default]
    #[serde(alias = "GShare", alias = "Perceptron")]
    GSharePath,
}

/// How branch penalties are applied to the cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PenaltyModel {
    /// Advance the global cycle counter by the penalty immediately.
    #[default]
    Charge,
    /// Block instruction fetch until the penalty has elapsed on the global
    /// cycle counter. Cycles spent in the memory hierarchy overlap the stall.
    FetchStall,
}

/// Hardware prefetcher attached to the L2 cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PrefetcherMode {
    /// No prefetching.
    None,
    /// Per-PC stride detector.
    Stride,
    /// Signature-correlated prefetcher with one level of look-ahead.
    #[default]
    #[serde(alias = "Spp", alias = "LookAhead")]
    Signature,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use uarchsim_core::config::{Config, PrefetcherMode, PredictorMode};
///
/// let config = Config::from_json(r#"{
///     "branch": { "predictor": "LastOutcome", "btb_lines": 256 },
///     "prefetch": { "algorithm": "Stride", "degree": 2 }
/// }"#).unwrap();
///
/// assert_eq!(config.branch.predictor, PredictorMode::LastOutcome);
/// assert_eq!(config.branch.btb_lines, 256);
/// assert_eq!(config.branch.btb_ways, 4);
/// assert_eq!(config.prefetch.algorithm, PrefetcherMode::Stride);
/// assert_eq!(config.cache.l2.lines, 16384);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// BTB and direction predictor configuration
    #[serde(default)]
    pub branch: BranchConfig,
    /// L1/L2 cache hierarchy configuration
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// Prefetcher configuration
    #[serde(default)]
    pub prefetch: PrefetchConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any error from
    /// [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks that every table can be indexed with a bitmask.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] for the first table whose set
    /// count is zero or not a power of two, and [`ConfigError::InvalidLineSize`]
    /// for a block size that is not a power of two.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = Geometry::new("btb", self.branch.btb_lines, self.branch.btb_ways)?;
        let _ = Geometry::new("predictor weights", self.branch.weights, 1)?;
        if self.branch.tables == 0 {
            return Err(ConfigError::InvalidGeometry {
                table: "predictor tables",
                lines: 0,
                ways: 1,
            });
        }
        if !self.cache.line_bytes.is_power_of_two() {
            return Err(ConfigError::InvalidLineSize(self.cache.line_bytes));
        }
        let _ = Geometry::new("l1", self.cache.l1.lines, self.cache.l1.ways)?;
        let _ = Geometry::new("l2", self.cache.l2.lines, self.cache.l2.ways)?;
        if self.prefetch.algorithm == PrefetcherMode::Stride {
            let _ = Geometry::new(
                "stride table",
                self.prefetch.stride_lines,
                self.prefetch.stride_ways,
            )?;
        }
        Ok(())
    }
}

/// Branch Target Buffer and direction predictor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchConfig {
    /// Direction prediction strategy
    #[serde(default)]
    pub predictor: PredictorMode,

    /// BTB line count
    #[serde(default = "defaults::btb_lines")]
    pub btb_lines: usize,

    /// BTB associativity
    #[serde(default = "defaults::btb_ways")]
    pub btb_ways: usize,

    /// Cycles charged for a BTB miss
    #[serde(default = "defaults::btb_penalty")]
    pub btb_penalty: u64,

    /// Cycles charged for a direction misprediction
    #[serde(default = "defaults::mispredict_penalty")]
    pub mispredict_penalty: u64,

    /// How penalties reach the cycle counter
    #[serde(default)]
    pub penalty_model: PenaltyModel,

    /// Number of weight tables (gshare/path mode)
    #[serde(default = "defaults::tables")]
    pub tables: usize,

    /// Weights per table; must be a power of two
    #[serde(default = "defaults::weights")]
    pub weights: usize,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            predictor: PredictorMode::default(),
            btb_lines: constants::BTB_LINES,
            btb_ways: constants::BTB_WAYS,
            btb_penalty: constants::BTB_PENALTY,
            mispredict_penalty: constants::MISPREDICT_PENALTY,
            penalty_model: PenaltyModel::default(),
            tables: constants::PRED_TABLES,
            weights: constants::PRED_WEIGHTS,
        }
    }
}

/// Geometry and lookup cost of one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Total number of lines
    pub lines: usize,
    /// Associativity (lines per set)
    pub ways: usize,
    /// Lookup cost in cycles
    pub latency: u64,
}

/// Two-level cache hierarchy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHierarchyConfig {
    /// Block size in bytes
    #[serde(default = "defaults::line_bytes")]
    pub line_bytes: usize,

    /// L1 data cache
    #[serde(default = "CacheHierarchyConfig::default_l1")]
    pub l1: CacheConfig,

    /// Unified L2 cache
    #[serde(default = "CacheHierarchyConfig::default_l2")]
    pub l2: CacheConfig,

    /// Cycles to fill an L2 miss from memory
    #[serde(default = "defaults::miss_penalty")]
    pub miss_penalty: u64,

    /// Cycles to write a dirty victim back
    #[serde(default = "defaults::writeback_penalty")]
    pub writeback_penalty: u64,
}

impl CacheHierarchyConfig {
    /// Returns the reference L1 geometry (1024 lines, 4 ways, 1 cycle).
    const fn default_l1() -> CacheConfig {
        CacheConfig {
            lines: constants::L1_LINES,
            ways: constants::L1_WAYS,
            latency: constants::L1_LATENCY,
        }
    }

    /// Returns the reference L2 geometry (16384 lines, 8 ways, 4 cycles).
    const fn default_l2() -> CacheConfig {
        CacheConfig {
            lines: constants::L2_LINES,
            ways: constants::L2_WAYS,
            latency: constants::L2_LATENCY,
        }
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            line_bytes: constants::BLOCK_BYTES,
            l1: Self::default_l1(),
            l2: Self::default_l2(),
            miss_penalty: constants::MEMORY_PENALTY,
            writeback_penalty: constants::WRITEBACK_PENALTY,
        }
    }
}

/// Prefetcher configuration.
///
/// The signature prefetcher's tables are fixed by the reference design and
/// are not configurable here.
#[derive(Debug, Clone, Deserialize)]
pub struct PrefetchConfig {
    /// Prefetch algorithm
    #[serde(default)]
    pub algorithm: PrefetcherMode,

    /// Strides ahead the stride prefetcher reaches
    #[serde(default = "defaults::degree")]
    pub degree: u64,

    /// Stride table line count
    #[serde(default = "defaults::stride_lines")]
    pub stride_lines: usize,

    /// Stride table associativity
    #[serde(default = "defaults::stride_ways")]
    pub stride_ways: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            algorithm: PrefetcherMode::default(),
            degree: constants::STRIDE_DEGREE,
            stride_lines: constants::STRIDE_LINES,
            stride_ways: constants::STRIDE_WAYS,
        }
    }
}
