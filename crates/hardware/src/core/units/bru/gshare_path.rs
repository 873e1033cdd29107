//! GShare/Path Weighted-Sum Predictor.
//!
//! A perceptron-style direction predictor with two weight banks per table:
//! one indexed by the global history register XOR the branch address
//! (gshare), one indexed by a hash of recent branch targets (path). The
//! prediction is the sign of the sum of every selected weight.
//!
//! The outcome of a branch is only known when the next instruction is
//! fetched, so `predict` returns a [`Snapshot`] of the indices it used and
//! `train` consumes that snapshot one instruction later. Training follows the
//! perceptron rule: weights move only on a misprediction or when the sum's
//! magnitude did not clear the training threshold, and the threshold itself
//! adapts toward the point where both cases are equally frequent.
//!
//! # Performance
//!
//! - **Time Complexity:** O(T) for both `predict()` and `train()`, T = table count
//! - **Space Complexity:** O(2 × T × W) signed 8-bit weights
//! - **Hardware Cost:** Moderate - 2T small SRAMs and an adder tree

use super::path_history::PathHistory;
use crate::common::error::ConfigError;
use crate::config::BranchConfig;
use crate::core::units::assoc::Geometry;

/// Coefficient used to calculate the initial training threshold.
const THETA_COEFF: f64 = 1.93;

/// Saturation point of the threshold training counter.
const THETA_COUNTER_LIMIT: i32 = 7;

/// Indices and result of one prediction, consumed by training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Per-table gshare weight index.
    pub gshare: Vec<usize>,
    /// Per-table path weight index.
    pub path: Vec<usize>,
    /// Weighted sum at prediction time.
    pub sum: i32,
    /// Predicted direction (`sum >= 0`).
    pub taken: bool,
}

/// GShare/Path predictor structure.
#[derive(Debug, Clone)]
pub struct GSharePathPredictor {
    /// Global History Register, newest outcome in bit 0.
    ghr: u64,
    /// Recent branch targets.
    path: PathHistory,
    /// Gshare-indexed weights, `tables × weights`, flattened.
    gshare_weights: Vec<i8>,
    /// Path-indexed weights, `tables × weights`, flattened.
    path_weights: Vec<i8>,
    /// Number of weight tables.
    tables: usize,
    /// Weights per table.
    weights: usize,
    /// Current training threshold.
    threshold: i32,
    /// Drives threshold adaptation.
    threshold_counter: i32,
}

impl GSharePathPredictor {
    /// Creates a predictor with all weights at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if there are no tables or the
    /// per-table weight count is not a power of two.
    pub fn new(config: &BranchConfig) -> Result<Self, ConfigError> {
        let tables = config.tables;
        let weights = Geometry::new("predictor weights", config.weights, 1)?.sets();
        if tables == 0 {
            return Err(ConfigError::InvalidGeometry {
                table: "predictor tables",
                lines: 0,
                ways: 1,
            });
        }
        Ok(Self {
            ghr: 0,
            path: PathHistory::new(2 * tables + 1),
            gshare_weights: vec![0; tables * weights],
            path_weights: vec![0; tables * weights],
            tables,
            weights,
            threshold: Self::initial_threshold(tables),
            threshold_counter: 0,
        })
    }

    /// `floor(1.93 × tables + tables / 2)`.
    pub fn initial_threshold(tables: usize) -> i32 {
        (THETA_COEFF * tables as f64 + (tables / 2) as f64) as i32
    }

    #[inline(always)]
    const fn mask(&self) -> u64 {
        self.weights as u64 - 1
    }

    /// Gshare index for table `i`.
    #[inline]
    fn gshare_index(&self, pc: u64, i: usize) -> usize {
        let hist = self.ghr.checked_shr(i as u32).unwrap_or(0) & self.mask();
        ((hist ^ pc) & self.mask()) as usize
    }

    /// Path index for table `i`: the i-th pair of targets, the older one
    /// shifted left by one bit.
    #[inline]
    fn path_index(&self, i: usize) -> usize {
        let recent = self.path.get(2 * i);
        let older = self.path.get(2 * i + 1);
        ((recent ^ (older << 1)) & self.mask()) as usize
    }

    /// Predicts the direction of the branch at `pc`.
    pub fn predict(&self, pc: u64) -> Snapshot {
        let mut gshare = Vec::with_capacity(self.tables);
        let mut path = Vec::with_capacity(self.tables);
        let mut sum = 0i32;

        for i in 0..self.tables {
            let g = self.gshare_index(pc, i);
            let p = self.path_index(i);
            let base = i * self.weights;
            sum += self.gshare_weights[base + g] as i32 + self.path_weights[base + p] as i32;
            gshare.push(g);
            path.push(p);
        }

        Snapshot {
            gshare,
            path,
            sum,
            taken: sum >= 0,
        }
    }

    /// Trains the weights selected by `snapshot` toward the realized outcome.
    ///
    /// Returns `true` if the weights were updated.
    pub fn train(&mut self, snapshot: &Snapshot, taken: bool) -> bool {
        let mispredicted = snapshot.taken != taken;
        let weak = snapshot.sum.abs() <= self.threshold;
        if !mispredicted && !weak {
            return false;
        }

        for (i, (&g, &p)) in snapshot.gshare.iter().zip(&snapshot.path).enumerate() {
            let base = i * self.weights;
            let gw = &mut self.gshare_weights[base + g];
            *gw = if taken { gw.saturating_add(1) } else { gw.saturating_sub(1) };
            let pw = &mut self.path_weights[base + p];
            *pw = if taken { pw.saturating_add(1) } else { pw.saturating_sub(1) };
        }

        if mispredicted {
            self.threshold_counter += 1;
            if self.threshold_counter >= THETA_COUNTER_LIMIT {
                self.threshold += 1;
                self.threshold_counter = 0;
            }
        } else {
            self.threshold_counter -= 1;
            if self.threshold_counter <= -THETA_COUNTER_LIMIT {
                self.threshold = (self.threshold - 1).max(1);
                self.threshold_counter = 0;
            }
        }
        true
    }

    /// Shifts a resolved branch into the global and path histories.
    pub fn update_history(&mut self, taken: bool, target: u64) {
        self.ghr = (self.ghr << 1) | u64::from(taken);
        self.path.push(target);
    }

    /// Current training threshold.
    pub const fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Global history register.
    pub const fn history(&self) -> u64 {
        self.ghr
    }

    /// Path history.
    pub const fn path(&self) -> &PathHistory {
        &self.path
    }

    /// Gshare weight of `table` at `index`.
    pub fn gshare_weight(&self, table: usize, index: usize) -> i8 {
        self.gshare_weights[table * self.weights + index]
    }

    /// Path weight of `table` at `index`.
    pub fn path_weight(&self, table: usize, index: usize) -> i8 {
        self.path_weights[table * self.weights + index]
    }

    /// Number of weight tables.
    pub const fn tables(&self) -> usize {
        self.tables
    }
}
