//! Associative Table Indexer Tests.
//!
//! Verifies set selection, lookup after install, victim priority (invalid
//! first, then least recent with lowest-way tie-break), and geometry
//! validation. Property tests cover arbitrary keys and stamps.

use proptest::prelude::*;
use rstest::rstest;
use uarchsim_core::common::error::ConfigError;
use uarchsim_core::core::units::assoc::{AssocTable, Geometry, TableLine};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Line {
    tag: u64,
    stamp: u64,
    valid: bool,
}

impl TableLine for Line {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn stamp(&self) -> u64 {
        self.stamp
    }
}

fn table(lines: usize, ways: usize) -> AssocTable<Line> {
    AssocTable::new(Geometry::new("test", lines, ways).unwrap())
}

fn install(t: &mut AssocTable<Line>, key: u64, stamp: u64) -> usize {
    let slot = t.victim(key);
    *t.line_mut(slot) = Line {
        tag: key,
        stamp,
        valid: true,
    };
    slot.index()
}

// ══════════════════════════════════════════════════════════
// 1. Geometry
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(512, 4, 128)]
#[case(1024, 4, 256)]
#[case(16384, 8, 2048)]
#[case(8, 8, 1)]
fn geometry_accepts_power_of_two_sets(#[case] lines: usize, #[case] ways: usize, #[case] sets: usize) {
    let g = Geometry::new("test", lines, ways).unwrap();
    assert_eq!(g.sets(), sets);
    assert_eq!(g.ways(), ways);
    assert_eq!(g.lines(), lines);
}

#[rstest]
#[case(0, 4)]
#[case(512, 0)]
#[case(384, 4)]
#[case(10, 4)]
fn geometry_rejects_unmaskable_shapes(#[case] lines: usize, #[case] ways: usize) {
    let err = Geometry::new("btb", lines, ways).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidGeometry { table: "btb", lines: l, ways: w } if l == lines && w == ways
    ));
}

/// BTB-style set selection: address bits [8:2] for 128 sets.
#[test]
fn set_selection_masks_key() {
    let g = Geometry::new("btb", 512, 4).unwrap();
    assert_eq!(g.set_of(0x1000 >> 2), 0);
    assert_eq!(g.set_of(0x1004 >> 2), 1);
    assert_eq!(g.set_of(0x11FC >> 2), 127);
    assert_eq!(g.set_of(0x1200 >> 2), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Lookup and victim selection
// ══════════════════════════════════════════════════════════

#[test]
fn empty_table_misses() {
    let t = table(16, 4);
    assert_eq!(t.lookup(3, 3), None);
    assert!(t.iter().all(|line| !line.valid));
}

#[test]
fn invalid_ways_are_filled_in_order() {
    let mut t = table(16, 4);
    // Keys 0, 4, 8, 12 all select set 0.
    let slots: Vec<usize> = [0, 4, 8, 12].iter().map(|&k| install(&mut t, k, 100)).collect();
    assert_eq!(slots, vec![0, 1, 2, 3]);
}

#[test]
fn invalid_way_beats_older_valid_way() {
    let mut t = table(8, 4);
    let _ = install(&mut t, 0, 50);
    let _ = install(&mut t, 2, 10);
    // Ways 2 and 3 are still invalid; way 2 wins over any stamp.
    assert_eq!(t.victim(0).index(), 2);
}

#[test]
fn full_set_evicts_least_recent() {
    let mut t = table(4, 4);
    for (key, stamp) in [(10, 40), (11, 7), (12, 30), (13, 90)] {
        let _ = install(&mut t, key, stamp);
    }
    assert_eq!(t.victim(0).index(), 1);
}

#[test]
fn equal_stamps_evict_lowest_way() {
    let mut t = table(4, 4);
    for key in 0..4 {
        let _ = install(&mut t, key, 5);
    }
    assert_eq!(t.victim(0).index(), 0);
}

#[test]
fn lookup_ignores_invalid_line_with_matching_tag() {
    let mut t = table(4, 4);
    let slot = t.victim(9);
    *t.line_mut(slot) = Line {
        tag: 9,
        stamp: 1,
        valid: false,
    };
    assert_eq!(t.lookup(9, 9), None);
}

#[test]
fn set_views_cover_only_selected_set() {
    let mut t = table(16, 4);
    let _ = install(&mut t, 5, 1);
    assert_eq!(t.set(1).len(), 4);
    assert!(t.set(1).iter().any(|line| line.tag == 5 && line.valid));
    assert!(t.set(0).iter().all(|line| !line.valid));

    for line in t.set_mut(1) {
        line.stamp = 77;
    }
    assert!(t.set(1).iter().all(|line| line.stamp == 77));
    assert!(t.set(2).iter().all(|line| line.stamp == 0));
}

// ══════════════════════════════════════════════════════════
// 3. Properties
// ══════════════════════════════════════════════════════════

proptest! {
    /// Set selection is deterministic and in range for every key.
    #[test]
    fn set_index_in_range(key in any::<u64>(), sets_log in 0u32..12, ways in 1usize..9) {
        let sets = 1usize << sets_log;
        let g = Geometry::new("prop", sets * ways, ways).unwrap();
        let set = g.set_of(key);
        prop_assert!(set < sets);
        prop_assert_eq!(set, g.set_of(key));
    }

    /// After installing a tag at the victim, lookup finds exactly that line.
    #[test]
    fn install_then_lookup(keys in proptest::collection::vec(any::<u64>(), 1..64)) {
        let mut t = table(64, 4);
        for (stamp, &key) in keys.iter().enumerate() {
            if t.lookup(key, key).is_some() {
                continue;
            }
            let slot = install(&mut t, key, stamp as u64);
            prop_assert_eq!(t.lookup(key, key).map(|s| s.index()), Some(slot));
            let matches = t.iter().filter(|line| line.valid && line.tag == key).count();
            prop_assert_eq!(matches, 1);
        }
    }

    /// In a full set the victim has the strictly smallest stamp, lowest way first.
    #[test]
    fn victim_is_lru(stamps in proptest::collection::vec(0u64..8, 4)) {
        let mut t = table(4, 4);
        for (way, &stamp) in stamps.iter().enumerate() {
            let slot = t.victim(0);
            prop_assert_eq!(slot.index(), way);
            *t.line_mut(slot) = Line { tag: way as u64, stamp, valid: true };
        }
        let min = *stamps.iter().min().unwrap();
        let expected = stamps.iter().position(|&s| s == min).unwrap();
        prop_assert_eq!(t.victim(0).index(), expected);
    }
}
