//! Global Simulator Constants.
//!
//! This module defines the fixed hardware parameters of the reference machine. It includes:
//! 1. **Branch Constants:** BTB geometry, penalties, and weight-table sizing.
//! 2. **Cache Constants:** L1/L2 geometry, block size, and cycle penalties.
//! 3. **Prefetcher Constants:** Signature, pattern, and prefetch-engine table geometry.
//!
//! Anything that a design-space sweep needs to vary is also exposed through
//! [`Config`](crate::config::Config); these values are its defaults.

/// Number of lines in the Branch Target Buffer.
pub const BTB_LINES: usize = 512;

/// Associativity of the Branch Target Buffer.
pub const BTB_WAYS: usize = 4;

/// Instruction-address bits below the BTB set index (bits [8:2] select the set).
pub const BTB_INDEX_SHIFT: u32 = 2;

/// Cycles lost when a branch is not found in the BTB.
pub const BTB_PENALTY: u64 = 8;

/// Cycles lost when a conditional branch direction is mispredicted.
pub const MISPREDICT_PENALTY: u64 = 8;

/// Number of weight tables in the gshare/path predictor.
pub const PRED_TABLES: usize = 16;

/// Number of weights per predictor table.
pub const PRED_WEIGHTS: usize = 1024;

/// Cache block size in bytes.
pub const BLOCK_BYTES: usize = 64;

/// Number of lines in the L1 data cache (64 KiB).
pub const L1_LINES: usize = 1024;

/// Associativity of the L1 data cache.
pub const L1_WAYS: usize = 4;

/// L1 lookup cost in cycles.
pub const L1_LATENCY: u64 = 1;

/// Number of lines in the unified L2 cache (1 MiB).
pub const L2_LINES: usize = 16384;

/// Associativity of the L2 cache.
pub const L2_WAYS: usize = 8;

/// L2 lookup cost in cycles, charged on demand accesses.
pub const L2_LATENCY: u64 = 4;

/// Main-memory fill penalty for an L2 miss.
pub const MEMORY_PENALTY: u64 = 200;

/// Cycles charged for writing a dirty victim back to the next level.
pub const WRITEBACK_PENALTY: u64 = 200;

/// Horizon of a look-ahead prefetch: cycles until its data is expected.
pub const LOOKAHEAD_HORIZON: u64 = 400;

/// Blocks per prefetcher page (4 KiB pages of 64-byte blocks).
pub const PAGE_BLOCKS_SHIFT: u32 = 6;

/// Signature table lines.
pub const ST_LINES: usize = 1024;
/// Signature table associativity.
pub const ST_WAYS: usize = 2;
/// Width of the signature table partial tag.
pub const ST_TAG_BIT: u32 = 8;

/// Width of a delta signature.
pub const SIG_LENGTH: u32 = 12;
/// Bits a signature is shifted left before a new delta is folded in.
pub const SIG_SHIFT: u32 = 3;

/// Pattern table lines (one set per signature).
pub const PT_LINES: usize = 16384;
/// Pattern table associativity (candidate deltas per signature).
pub const PT_WAYS: usize = 4;
/// Width of an encoded delta stored as a pattern table tag.
pub const PT_TAG_BIT: u32 = 7;
/// Width of a pattern table confidence counter.
pub const COUNTER_BIT: u32 = 3;

/// Prefetch engine lines.
pub const PE_LINES: usize = 512;
/// Prefetch engine associativity.
pub const PE_WAYS: usize = 2;
/// Width of the prefetch engine page tag.
pub const PE_TAG_BIT: u32 = 16;

/// Hash multiplier folding the PC into a signature table set.
pub const PRIME1: u64 = 509;
/// Hash multiplier folding the PC into a signature table tag.
pub const PRIME2: u64 = 257;
/// Hash multiplier folding a page number into a prefetch engine set.
pub const PRIME3: u64 = 251;

/// Lines in the stride prefetcher's per-PC table.
pub const STRIDE_LINES: usize = 256;
/// Associativity of the stride prefetcher's table.
pub const STRIDE_WAYS: usize = 4;
/// Default stride prefetch degree.
pub const STRIDE_DEGREE: u64 = 1;
