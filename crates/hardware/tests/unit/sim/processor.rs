//! Driver Tests.
//!
//! Verifies one-record-per-invocation processing: branch lookup and
//! deferred resolution, both penalty models, operand order through the
//! memory hierarchy, and end-of-trace and error handling.

use std::io;

use pretty_assertions::assert_eq;
use rstest::rstest;
use uarchsim_core::SimContext;
use uarchsim_core::common::error::{SimError, TraceError};
use uarchsim_core::config::{CacheConfig, Config};
use uarchsim_core::isa::{BranchKind, InstructionRecord};
use uarchsim_core::{Processor, SimStats};

use crate::common::builder::config::{quiet_config, stall_config};
use crate::common::harness::Harness;
use crate::common::mocks::trace::MockTrace;

fn cond(pc: u64) -> InstructionRecord {
    InstructionRecord::branch(pc, 4, BranchKind::Conditional)
}

// ══════════════════════════════════════════════════════════
// 1. Branches
// ══════════════════════════════════════════════════════════

/// A cold conditional branch that falls through: BTB miss on fetch,
/// misprediction when the next record arrives.
#[test]
fn cold_fall_through_branch_charges_both_penalties() {
    let mut h = Harness::new(
        &quiet_config(),
        [cond(0x404), InstructionRecord::other(0x408, 4)],
    );

    assert_eq!(h.step(), 8);
    assert!(h.cpu.pending_branch().is_some());
    assert_eq!(h.stats().mispredictions, 0, "resolved only by the next record");

    assert_eq!(h.step(), 8);
    assert!(h.cpu.pending_branch().is_none());

    let stats = h.stats();
    assert_eq!(stats.instructions, 2);
    assert_eq!(stats.branches, 1);
    assert_eq!(stats.btb_misses, 1);
    assert_eq!(stats.mispredictions, 1);
    assert_eq!(stats.branch_penalty_cycles, 16);
}

#[test]
fn cold_taken_branch_only_misses_btb() {
    let mut h = Harness::new(
        &quiet_config(),
        [cond(0x404), InstructionRecord::other(0x1000, 4)],
    );
    h.drain();

    let stats = h.stats();
    assert_eq!(stats.btb_misses, 1);
    assert_eq!(stats.mispredictions, 0);
    assert_eq!(stats.branch_penalty_cycles, 8);
    assert_eq!(h.ctx.read(), 8);
}

#[rstest]
#[case(BranchKind::Call)]
#[case(BranchKind::Return)]
#[case(BranchKind::Unconditional)]
#[case(BranchKind::Syscall)]
fn non_conditional_branches_never_mispredict(#[case] kind: BranchKind) {
    let mut h = Harness::new(
        &quiet_config(),
        [
            InstructionRecord::branch(0x404, 4, kind),
            InstructionRecord::other(0x408, 4),
        ],
    );
    h.drain();

    let stats = h.stats();
    assert_eq!(stats.branches, 1);
    assert_eq!(stats.btb_misses, 1);
    assert_eq!(stats.mispredictions, 0);
}

#[test]
fn warm_branch_hits_btb() {
    let mut h = Harness::new(
        &quiet_config(),
        [
            cond(0x404),
            InstructionRecord::other(0x1000, 4),
            cond(0x404),
            InstructionRecord::other(0x1000, 4),
        ],
    );
    h.drain();

    assert!(h.cpu.branch_unit().btb().contains(0x404));
    let stats = h.stats();
    assert_eq!(stats.branches, 2);
    assert_eq!(stats.btb_misses, 1);
    assert_eq!(stats.mispredictions, 0);
}

/// A branch still waiting at end of trace is dropped unresolved.
#[test]
fn trailing_branch_is_not_resolved() {
    let mut h = Harness::new(&quiet_config(), [cond(0x404)]);
    let _ = h.step();
    assert!(!h.cpu.clock(&mut h.ctx, &mut h.trace).unwrap());

    assert!(h.cpu.pending_branch().is_none());
    assert_eq!(h.stats().mispredictions, 0);
    assert_eq!(h.stats().instructions, 1);
}

// ══════════════════════════════════════════════════════════
// 2. Fetch-stall penalties
// ══════════════════════════════════════════════════════════

#[test]
fn fetch_stall_defers_penalty() {
    let mut h = Harness::new(
        &stall_config(),
        [cond(0x404), InstructionRecord::other(0x408, 4)],
    );

    assert_eq!(h.step(), 0, "no cycles charged directly");
    assert_eq!(h.cpu.fetch_resume(), 8);

    for _ in 0..8 {
        assert_eq!(h.step(), 0);
        h.ctx.advance(1);
    }
    assert_eq!(h.trace.remaining(), 1, "nothing consumed while stalled");
    assert_eq!(h.stats().stall_ticks, 8);

    let _ = h.step();
    assert_eq!(h.cpu.fetch_resume(), 16);

    let stats = h.stats();
    assert_eq!(stats.instructions, 2);
    assert_eq!(stats.mispredictions, 1);
    assert_eq!(stats.branch_penalty_cycles, 16);
}

/// Memory cycles spent after a BTB miss count toward the stall.
#[test]
fn cache_cycles_overlap_stall() {
    let branch_with_load = InstructionRecord {
        read_address: Some(0x8000),
        ..cond(0x404)
    };
    let mut h = Harness::new(
        &stall_config(),
        [branch_with_load, InstructionRecord::other(0x1000, 4)],
    );

    assert_eq!(h.step(), 205);
    assert_eq!(h.cpu.fetch_resume(), 8);
    let _ = h.step();
    assert_eq!(h.stats().stall_ticks, 0);
}

// ══════════════════════════════════════════════════════════
// 3. Memory operands
// ══════════════════════════════════════════════════════════

#[test]
fn cold_load_costs_205_cycles() {
    let mut h = Harness::new(&quiet_config(), [InstructionRecord::load(0x400, 4, 0x8000)]);
    assert_eq!(h.step(), 205);

    let stats = h.stats();
    assert_eq!(stats.l1_misses, 1);
    assert_eq!(stats.l2_misses, 1);
}

#[test]
fn plain_instruction_costs_nothing() {
    let mut h = Harness::new(&quiet_config(), [InstructionRecord::other(0x400, 4)]);
    assert_eq!(h.step(), 0);
    assert_eq!(h.stats().instructions, 1);
}

/// With a one-line L1, the order read, read2, write is visible in timing:
/// A misses, B evicts A, the write to A refetches it from L2.
#[test]
fn operands_go_read_then_read2_then_write() {
    let mut config = quiet_config();
    config.cache.l1 = CacheConfig {
        lines: 1,
        ways: 1,
        latency: 1,
    };
    let record = InstructionRecord {
        write_address: Some(0x0),
        ..InstructionRecord::load(0x400, 4, 0x0).with_read2(0x40)
    };
    let mut h = Harness::new(&config, [record]);

    assert_eq!(h.step(), 205 + 205 + 5);

    let memory = h.cpu.memory();
    let slot = memory.l1().lookup(0x0).unwrap();
    assert!(memory.l1().line(slot).dirty);
    assert!(!memory.l2().contains(0x0), "store drops the L2 copy");
    assert!(memory.l2().contains(0x40));
    assert_eq!(memory.stats().writebacks, 0);
}

#[test]
fn store_hits_after_load() {
    let mut h = Harness::new(
        &quiet_config(),
        [
            InstructionRecord::load(0x400, 4, 0x8000),
            InstructionRecord::store(0x404, 4, 0x8010),
        ],
    );
    assert_eq!(h.step(), 205);
    assert_eq!(h.step(), 1);
    assert_eq!(h.stats().l1_hits, 1);
}

// ══════════════════════════════════════════════════════════
// 4. Construction and errors
// ══════════════════════════════════════════════════════════

#[test]
fn rejects_invalid_config() {
    let mut config = Config::default();
    config.branch.btb_lines = 100;
    assert!(Processor::new(&config).is_err());
}

#[test]
fn fresh_processor_has_empty_stats() {
    let cpu = Processor::new(&quiet_config()).unwrap();
    assert_eq!(cpu.stats(), SimStats::default());
    assert_eq!(cpu.fetch_resume(), 0);
}

#[test]
fn trace_error_is_surfaced() {
    let mut trace = MockTrace::new();
    let mut calls = 0;
    let _ = trace.expect_next_instruction().returning(move || {
        calls += 1;
        if calls == 1 {
            Ok(Some(InstructionRecord::load(0x400, 4, 0x8000)))
        } else {
            Err(TraceError::Io(io::Error::other("disk gone")))
        }
    });

    let mut cpu = Processor::new(&quiet_config()).unwrap();
    let mut ctx = SimContext::new();
    assert!(cpu.clock(&mut ctx, &mut trace).unwrap());

    let err = cpu.clock(&mut ctx, &mut trace).unwrap_err();
    assert!(matches!(err, SimError::Trace(TraceError::Io(_))));
    assert_eq!(cpu.stats().instructions, 1);
    assert_eq!(ctx.read(), 205);
}
