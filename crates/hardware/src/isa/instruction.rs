//! Instruction record.
//!
//! Owned by the trace source and read-only to the core. Memory operands are
//! optional; `Some` marks the operand as present.

use serde::{Deserialize, Serialize};

/// Coarse operation class of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Operation {
    /// Control transfer.
    Branch,
    /// Memory read.
    #[serde(alias = "MemLoad")]
    Load,
    /// Memory write.
    #[serde(alias = "MemStore")]
    Store,
    /// Anything else (ALU, FP, NOP, barriers, ...).
    #[default]
    #[serde(other)]
    Other,
}

/// Kind of control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BranchKind {
    /// System call.
    Syscall,
    /// Subroutine call.
    Call,
    /// Subroutine return.
    Return,
    /// Unconditional jump.
    #[serde(alias = "Uncond")]
    Unconditional,
    /// Conditional branch; the only kind whose direction is predicted.
    #[default]
    #[serde(alias = "Cond")]
    Conditional,
}

/// One instruction pulled from an execution trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionRecord {
    /// Instruction address.
    #[serde(alias = "pc")]
    pub address: u64,
    /// Encoded size in bytes.
    pub size: u8,
    /// Operation class.
    #[serde(default)]
    pub operation: Operation,
    /// Branch kind; meaningful only when `operation` is [`Operation::Branch`].
    #[serde(default)]
    pub branch: BranchKind,
    /// First read operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_address: Option<u64>,
    /// Second read operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read2_address: Option<u64>,
    /// Write operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_address: Option<u64>,
}

impl InstructionRecord {
    /// A non-branch, non-memory instruction.
    pub const fn other(address: u64, size: u8) -> Self {
        Self {
            address,
            size,
            operation: Operation::Other,
            branch: BranchKind::Conditional,
            read_address: None,
            read2_address: None,
            write_address: None,
        }
    }

    /// A branch of the given kind.
    pub const fn branch(address: u64, size: u8, kind: BranchKind) -> Self {
        Self {
            operation: Operation::Branch,
            branch: kind,
            ..Self::other(address, size)
        }
    }

    /// A load from `read`.
    pub const fn load(address: u64, size: u8, read: u64) -> Self {
        Self {
            operation: Operation::Load,
            read_address: Some(read),
            ..Self::other(address, size)
        }
    }

    /// A store to `write`.
    pub const fn store(address: u64, size: u8, write: u64) -> Self {
        Self {
            operation: Operation::Store,
            write_address: Some(write),
            ..Self::other(address, size)
        }
    }

    /// Adds a second read operand.
    #[must_use]
    pub const fn with_read2(mut self, read2: u64) -> Self {
        self.read2_address = Some(read2);
        self
    }

    /// Whether this is a control transfer.
    pub fn is_branch(&self) -> bool {
        self.operation == Operation::Branch
    }

    /// Whether this is a conditional branch.
    pub fn is_conditional(&self) -> bool {
        self.is_branch() && self.branch == BranchKind::Conditional
    }

    /// Address of the sequentially next instruction.
    pub const fn fall_through(&self) -> u64 {
        self.address.wrapping_add(self.size as u64)
    }
}
