//! # Statistics Tests
//!
//! Tests for derived ratios, memory counter import, the text report and
//! JSON serialization.

use pretty_assertions::assert_eq;
use rstest::rstest;
use uarchsim_core::SimStats;
use uarchsim_core::core::units::cache::MemoryStats;

fn sample() -> SimStats {
    SimStats {
        instructions: 1000,
        branches: 200,
        btb_misses: 20,
        mispredictions: 50,
        branch_penalty_cycles: 560,
        l1_hits: 300,
        l1_misses: 100,
        l2_hits: 25,
        l2_misses: 75,
        writebacks: 10,
        total_prefetches: 40,
        used_prefetches: 30,
        prefetch_wait_cycles: 900,
        begin_cycle: 0,
        end_cycle: 4000,
        ..SimStats::default()
    }
}

#[test]
fn test_ratios() {
    let stats = sample();
    assert_eq!(stats.cycles(), 4000);
    assert_eq!(stats.ipc(), Some(0.25));
    assert_eq!(stats.btb_hit_rate(), Some(0.9));
    assert_eq!(stats.prediction_accuracy(), Some(0.75));
    assert_eq!(stats.l1_hit_rate(), Some(0.75));
    assert_eq!(stats.l2_hit_rate(), Some(0.25));
    assert_eq!(stats.prefetch_accuracy(), Some(0.75));
}

#[rstest]
#[case::ipc(SimStats::ipc)]
#[case::btb(SimStats::btb_hit_rate)]
#[case::accuracy(SimStats::prediction_accuracy)]
#[case::l1(SimStats::l1_hit_rate)]
#[case::l2(SimStats::l2_hit_rate)]
#[case::prefetch(SimStats::prefetch_accuracy)]
fn test_zero_denominator_is_none(#[case] ratio: fn(&SimStats) -> Option<f64>) {
    assert_eq!(ratio(&SimStats::default()), None);
}

#[test]
fn test_cycles_saturate() {
    let stats = SimStats {
        begin_cycle: 10,
        end_cycle: 5,
        ..SimStats::default()
    };
    assert_eq!(stats.cycles(), 0);
}

#[test]
fn test_record_memory_copies_every_counter() {
    let memory = MemoryStats {
        l1_hits: 1,
        l1_misses: 2,
        l2_hits: 3,
        l2_misses: 4,
        writebacks: 5,
        total_prefetches: 6,
        used_prefetches: 7,
        prefetch_wait_cycles: 8,
    };
    let mut stats = SimStats {
        instructions: 9,
        ..SimStats::default()
    };
    stats.record_memory(&memory);

    assert_eq!(
        stats,
        SimStats {
            instructions: 9,
            l1_hits: 1,
            l1_misses: 2,
            l2_hits: 3,
            l2_misses: 4,
            writebacks: 5,
            total_prefetches: 6,
            used_prefetches: 7,
            prefetch_wait_cycles: 8,
            ..SimStats::default()
        }
    );
}

#[test]
fn test_prefetch_accuracy_pct() {
    let memory = MemoryStats {
        total_prefetches: 8,
        used_prefetches: 6,
        ..MemoryStats::default()
    };
    assert_eq!(memory.prefetch_accuracy_pct(), 75);
    assert_eq!(MemoryStats::default().prefetch_accuracy_pct(), 0);
}

#[test]
fn test_report_sections() {
    let report = sample().to_string();

    assert!(report.contains("MICROARCHITECTURE SIMULATION STATISTICS"));
    assert!(report.contains("BRANCH PREDICTION"));
    assert!(report.contains("MEMORY HIERARCHY"));
    assert!(report.contains("PREFETCHER"));

    assert!(report.contains("sim_cycles               4000"));
    assert!(report.contains("sim_ipc                  0.2500"));
    assert!(report.contains("bp.btb_hit_rate        90.00%"));
    assert!(report.contains("bp.accuracy            75.00%"));
    assert!(report.contains("pf.accuracy            75.00%"));
    assert!(report.contains("writebacks             10"));
}

#[test]
fn test_empty_report_prints_na() {
    let report = SimStats::default().to_string();
    assert!(report.contains("sim_ipc                  n/a"));
    assert!(report.contains("bp.accuracy            n/a"));
    assert!(report.contains("hit_rate: n/a"));
}

#[test]
fn test_serializes_counters() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["instructions"], 1000);
    assert_eq!(json["mispredictions"], 50);
    assert_eq!(json["end_cycle"], 4000);
    assert_eq!(json["prefetch_wait_cycles"], 900);
}
