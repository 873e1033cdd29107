//! Instruction trace records.
//!
//! The simulator is trace driven: it never decodes instruction encodings.
//! Each record carries only what the branch unit and the memory hierarchy
//! need (address, size, operation kind, branch kind, memory operands).

/// Instruction record and its operation/branch classification.
pub mod instruction;

pub use instruction::{BranchKind, InstructionRecord, Operation};
