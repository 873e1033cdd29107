//! Branch Unit Tests.
//!
//! Verifies fetch-time lookup and prediction for every predictor mode, and
//! resolution from the next fetched address.

use rstest::rstest;
use uarchsim_core::config::{BranchConfig, PredictorMode};
use uarchsim_core::core::units::bru::{BranchUnit, DirectionPredictor};
use uarchsim_core::isa::{BranchKind, InstructionRecord};

const A: u64 = 0x4000;

fn unit(predictor: PredictorMode) -> BranchUnit {
    BranchUnit::new(&BranchConfig {
        predictor,
        ..BranchConfig::default()
    })
    .unwrap()
}

fn cond(pc: u64) -> InstructionRecord {
    InstructionRecord::branch(pc, 4, BranchKind::Conditional)
}

// ══════════════════════════════════════════════════════════
// 1. Cold branch
// ══════════════════════════════════════════════════════════

/// BTB-cold conditional branch falling through to `A + 4`: one miss,
/// predicted taken, mispredicted.
#[rstest]
#[case(PredictorMode::None)]
#[case(PredictorMode::LastOutcome)]
#[case(PredictorMode::GSharePath)]
fn cold_branch_falls_through(#[case] predictor: PredictorMode) {
    let mut bu = unit(predictor);
    let pending = bu.lookup(&cond(A), 0);

    assert!(!pending.btb_hit);
    assert!(pending.predicted_taken);
    assert!(bu.btb().contains(A));

    let r = bu.resolve(pending, A + 4);
    assert!(!r.taken);
    assert!(r.mispredicted);
}

#[test]
fn second_lookup_hits() {
    let mut bu = unit(PredictorMode::GSharePath);
    let first = bu.lookup(&cond(A), 0);
    let _ = bu.resolve(first, 0x5000);

    let second = bu.lookup(&cond(A), 1);
    assert!(second.btb_hit);
    assert_eq!(bu.btb().line(second.slot).clock, 1);
}

/// The weighted model's snapshot is kept even on a BTB miss.
#[test]
fn btb_miss_still_snapshots_gshare_path() {
    let mut bu = unit(PredictorMode::GSharePath);
    let pending = bu.lookup(&cond(A), 0);
    assert!(pending.snapshot.is_some());

    let _ = bu.resolve(pending, A + 4);
    let DirectionPredictor::GSharePath(p) = bu.predictor() else {
        panic!("expected gshare/path predictor");
    };
    assert_eq!(p.history(), 0);
    assert_eq!(p.path().get(0), A + 4);
    assert!(p.predict(A).sum < 0, "trained toward not-taken");
}

// ══════════════════════════════════════════════════════════
// 2. Modes after warm-up
// ══════════════════════════════════════════════════════════

#[test]
fn always_taken_never_learns() {
    let mut bu = unit(PredictorMode::None);
    for _ in 0..5 {
        let p = bu.lookup(&cond(A), 0);
        assert!(p.predicted_taken);
        let _ = bu.resolve(p, A + 4);
    }
}

#[test]
fn last_outcome_repeats_previous_direction() {
    let mut bu = unit(PredictorMode::LastOutcome);
    let p = bu.lookup(&cond(A), 0);
    let _ = bu.resolve(p, A + 4);

    let p = bu.lookup(&cond(A), 1);
    assert!(!p.predicted_taken);
    let r = bu.resolve(p, 0x8000);
    assert!(r.taken && r.mispredicted);

    let p = bu.lookup(&cond(A), 2);
    assert!(p.predicted_taken);
    assert!(!bu.resolve(p, 0x8000).mispredicted);
}

#[test]
fn gshare_path_learns_always_not_taken() {
    let mut bu = unit(PredictorMode::GSharePath);
    let mut last = None;
    for cycle in 0..8 {
        let p = bu.lookup(&cond(A), cycle);
        last = Some(bu.resolve(p, A + 4));
    }
    assert!(!last.unwrap().mispredicted);
}

// ══════════════════════════════════════════════════════════
// 3. Non-conditional branches
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(BranchKind::Call)]
#[case(BranchKind::Return)]
#[case(BranchKind::Unconditional)]
#[case(BranchKind::Syscall)]
fn non_conditional_never_mispredicts(#[case] kind: BranchKind) {
    let mut bu = unit(PredictorMode::GSharePath);
    let pending = bu.lookup(&InstructionRecord::branch(A, 4, kind), 0);
    assert!(pending.snapshot.is_none());
    assert!(!pending.conditional);

    // Even landing on the fall-through address counts as taken.
    let r = bu.resolve(pending, A + 4);
    assert!(r.taken);
    assert!(!r.mispredicted);

    let DirectionPredictor::GSharePath(p) = bu.predictor() else {
        panic!("expected gshare/path predictor");
    };
    assert_eq!(p.history(), 1, "feeds the global history as taken");
}

#[test]
fn btb_records_branch_kind() {
    let mut bu = unit(PredictorMode::None);
    let p = bu.lookup(&InstructionRecord::branch(A, 4, BranchKind::Call), 0);
    assert_eq!(bu.btb().line(p.slot).kind, BranchKind::Call);
}
