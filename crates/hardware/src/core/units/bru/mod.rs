//! Branch resolution unit (BRU).
//!
//! This module contains the Branch Target Buffer and the direction
//! predictors that share it. The predictor strategy is chosen once at
//! construction:
//!
//! - **AlwaysTaken:** every branch is guessed taken; nothing is trained.
//! - **LastOutcome:** the BTB line's hint bit repeats the branch's last direction.
//! - **GSharePath:** weighted sum over global-history and path-indexed tables.
//!
//! A branch is looked up when fetched and resolved when the next instruction
//! arrives: a conditional branch was not taken iff the next address equals
//! its fall-through address.

/// Branch Target Buffer.
pub mod btb;

/// Weighted-sum gshare/path direction predictor.
pub mod gshare_path;

/// Bounded branch-target history used by the path tables.
pub mod path_history;

use self::btb::Btb;
use self::gshare_path::{GSharePathPredictor, Snapshot};
use crate::common::error::ConfigError;
use crate::config::{BranchConfig, PredictorMode};
use crate::core::units::assoc::Slot;
use crate::isa::InstructionRecord;

/// Direction predictor selected at construction.
///
/// An enum rather than a trait object keeps dispatch static in the fetch loop.
#[derive(Debug, Clone)]
pub enum DirectionPredictor {
    /// Always taken.
    AlwaysTaken,
    /// BTB hint bit.
    LastOutcome,
    /// Weighted gshare/path tables.
    GSharePath(Box<GSharePathPredictor>),
}

/// A fetched branch waiting for its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBranch {
    /// Branch address.
    pub address: u64,
    /// Address of the next sequential instruction.
    pub fall_through: u64,
    /// Whether the branch is conditional.
    pub conditional: bool,
    /// BTB line holding the branch.
    pub slot: Slot,
    /// Whether the lookup hit in the BTB.
    pub btb_hit: bool,
    /// Direction the front end followed.
    pub predicted_taken: bool,
    /// Weighted-sum indices, for the gshare/path predictor.
    pub snapshot: Option<Snapshot>,
}

/// Outcome of resolving a [`PendingBranch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Realized direction.
    pub taken: bool,
    /// Whether the followed direction was wrong.
    pub mispredicted: bool,
}

/// BTB plus direction predictor.
#[derive(Debug, Clone)]
pub struct BranchUnit {
    btb: Btb,
    predictor: DirectionPredictor,
}

impl BranchUnit {
    /// Creates a branch unit based on configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if the BTB or weight tables
    /// cannot be indexed with a bitmask.
    pub fn new(config: &BranchConfig) -> Result<Self, ConfigError> {
        let predictor = match config.predictor {
            PredictorMode::None => DirectionPredictor::AlwaysTaken,
            PredictorMode::LastOutcome => DirectionPredictor::LastOutcome,
            PredictorMode::GSharePath => {
                DirectionPredictor::GSharePath(Box::new(GSharePathPredictor::new(config)?))
            }
        };
        Ok(Self {
            btb: Btb::new(config.btb_lines, config.btb_ways)?,
            predictor,
        })
    }

    /// Looks up a fetched branch and predicts its direction.
    ///
    /// On a BTB miss the branch is installed over the set's victim and the
    /// front end follows the default taken bias; the weighted-sum snapshot is
    /// still taken so the tables learn from this occurrence.
    pub fn lookup(&mut self, inst: &InstructionRecord, now: u64) -> PendingBranch {
        let pc = inst.address;
        let conditional = inst.is_conditional();

        let (slot, btb_hit) = match self.btb.lookup(pc) {
            Some(slot) => {
                self.btb.touch(slot, now);
                (slot, true)
            }
            None => (self.btb.allocate(pc, inst.branch, now), false),
        };

        let snapshot = match &self.predictor {
            DirectionPredictor::GSharePath(p) if conditional => Some(p.predict(pc)),
            _ => None,
        };

        let predicted_taken = if !conditional || !btb_hit {
            true
        } else {
            match &self.predictor {
                DirectionPredictor::AlwaysTaken => true,
                DirectionPredictor::LastOutcome => self.btb.line(slot).hint,
                DirectionPredictor::GSharePath(_) => snapshot.as_ref().is_none_or(|s| s.taken),
            }
        };

        PendingBranch {
            address: pc,
            fall_through: inst.fall_through(),
            conditional,
            slot,
            btb_hit,
            predicted_taken,
            snapshot,
        }
    }

    /// Resolves `pending` now that the next fetched address is known, and
    /// trains the predictor.
    ///
    /// Only conditional branches can mispredict; every other kind resolves
    /// taken and still feeds the histories.
    pub fn resolve(&mut self, pending: PendingBranch, next_address: u64) -> Resolution {
        let taken = !pending.conditional || next_address != pending.fall_through;
        let mispredicted = pending.conditional && taken != pending.predicted_taken;

        match &mut self.predictor {
            DirectionPredictor::AlwaysTaken => {}
            DirectionPredictor::LastOutcome => {
                self.btb.set_hint(pending.slot, pending.address, taken);
            }
            DirectionPredictor::GSharePath(p) => {
                if let Some(snapshot) = &pending.snapshot {
                    let _ = p.train(snapshot, taken);
                }
                p.update_history(taken, next_address);
            }
        }

        Resolution {
            taken,
            mispredicted,
        }
    }

    /// Branch Target Buffer.
    pub const fn btb(&self) -> &Btb {
        &self.btb
    }

    /// Direction predictor.
    pub const fn predictor(&self) -> &DirectionPredictor {
        &self.predictor
    }
}
