//! Branch Target Buffer (BTB).
//!
//! The BTB is a set-associative cache of recently seen branch addresses. A
//! hit tells the front end the instruction is a known branch and gates the
//! direction predictor; a miss costs a fixed penalty while the branch is
//! installed. Each line also carries a one-bit direction hint used by the
//! last-outcome predictor.
//!
//! Sets are selected by address bits [8:2] in the reference geometry
//! (512 lines, 4 ways); the tag is the full branch address, so at most one
//! valid line per address can exist in a set.

use crate::core::units::assoc::{AssocTable, Geometry, Slot, TableLine};
use crate::common::constants::BTB_INDEX_SHIFT;
use crate::common::error::ConfigError;
use crate::isa::BranchKind;

/// An entry in the Branch Target Buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BtbLine {
    /// Branch address.
    pub tag: u64,
    /// Cycle of the last lookup hit or allocation.
    pub clock: u64,
    /// Whether the line holds a branch.
    pub valid: bool,
    /// Branch kind seen at allocation.
    pub kind: BranchKind,
    /// Last-outcome direction hint (`true` = taken).
    pub hint: bool,
}

impl TableLine for BtbLine {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn stamp(&self) -> u64 {
        self.clock
    }
}

/// Branch Target Buffer structure.
#[derive(Debug, Clone)]
pub struct Btb {
    table: AssocTable<BtbLine>,
}

impl Btb {
    /// Creates an empty BTB of `lines` lines in sets of `ways`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if the set count is not a
    /// power of two.
    pub fn new(lines: usize, ways: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            table: AssocTable::new(Geometry::new("btb", lines, ways)?),
        })
    }

    /// Set-selection key: the address without its instruction-alignment bits.
    #[inline(always)]
    const fn key(pc: u64) -> u64 {
        pc >> BTB_INDEX_SHIFT
    }

    /// Finds the line holding `pc`.
    pub fn lookup(&self, pc: u64) -> Option<Slot> {
        self.table.lookup(Self::key(pc), pc)
    }

    /// Whether `pc` is currently held.
    pub fn contains(&self, pc: u64) -> bool {
        self.lookup(pc).is_some()
    }

    /// Refreshes the recency clock of a line after a hit.
    pub fn touch(&mut self, slot: Slot, now: u64) {
        self.table.line_mut(slot).clock = now;
    }

    /// Installs `pc` over the set's victim.
    ///
    /// The new line is valid and biased toward taken.
    pub fn allocate(&mut self, pc: u64, kind: BranchKind, now: u64) -> Slot {
        let slot = self.table.victim(Self::key(pc));
        *self.table.line_mut(slot) = BtbLine {
            tag: pc,
            clock: now,
            valid: true,
            kind,
            hint: true,
        };
        slot
    }

    /// Returns the line at `slot`.
    pub fn line(&self, slot: Slot) -> &BtbLine {
        self.table.line(slot)
    }

    /// Records the realized direction of `pc` in its hint bit.
    ///
    /// Ignored if the line was reallocated to another branch since `slot`
    /// was handed out.
    pub fn set_hint(&mut self, slot: Slot, pc: u64, taken: bool) {
        let line = self.table.line_mut(slot);
        if line.valid && line.tag == pc {
            line.hint = taken;
        }
    }

    /// Number of valid lines.
    pub fn occupancy(&self) -> usize {
        self.table.iter().filter(|line| line.valid).count()
    }
}
