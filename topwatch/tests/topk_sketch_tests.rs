//! Test suite for the sliding-window Top-K sketch
//!
//! Covers construction, counting, heap maintenance, window expiry,
//! history series and the quantified invariants of the design.

use topwatch::sketch::TopkSketch;

fn sketch(k: usize) -> TopkSketch {
    TopkSketch::with_seed(k, 64, 3, 10, 0.9, 256, 42).unwrap()
}

// ==========================================================================
// Category 1: Construction
// ==========================================================================

#[test]
fn test_new_valid_params() {
    assert!(TopkSketch::new(1, 16, 1, 1, 0.0, 1).is_ok());
    assert!(TopkSketch::new(100, 2048, 4, 60, 0.9, 256).is_ok());
    assert!(TopkSketch::new(5, 64, 8, 600, 1.0, 1024).is_ok());
}

#[test]
fn test_new_invalid_params() {
    assert!(TopkSketch::new(0, 16, 3, 10, 0.9, 256).is_err(), "k=0");
    assert!(TopkSketch::new(5, 0, 3, 10, 0.9, 256).is_err(), "width=0");
    assert!(TopkSketch::new(5, 16, 0, 10, 0.9, 256).is_err(), "depth=0");
    assert!(TopkSketch::new(5, 16, 3, 0, 0.9, 256).is_err(), "history=0");
    assert!(TopkSketch::new(5, 16, 3, 10, -0.1, 256).is_err(), "decay<0");
    assert!(TopkSketch::new(5, 16, 3, 10, 1.5, 256).is_err(), "decay>1");
    assert!(TopkSketch::new(5, 16, 3, 10, 0.9, 0).is_err(), "lut=0");
}

// ==========================================================================
// Category 2: Counting
// ==========================================================================

#[test]
fn test_exact_counts_without_collisions() {
    let mut s = sketch(3);
    for _ in 0..100 {
        s.incr("a");
    }
    for _ in 0..50 {
        s.incr("b");
    }
    for _ in 0..10 {
        s.incr("c");
    }
    assert_eq!(s.count("a"), 100);
    assert_eq!(s.count("b"), 50);
    assert_eq!(s.count("c"), 10);
    assert_eq!(s.count("absent"), 0);
}

#[test]
fn test_count_monotone_between_ticks() {
    let mut s = sketch(3);
    let mut prev = 0;
    for _ in 0..200 {
        s.incr("steady");
        let now = s.count("steady");
        assert!(now >= prev, "count must not decrease without ticks/decay");
        prev = now;
    }
}

#[test]
fn test_count_min_over_rows_never_underestimates_alone() {
    // 1000 distinct items into a small grid: collisions certain, but an
    // item that kept at least one bucket reports its own mass or more
    let mut s = TopkSketch::with_seed(5, 32, 3, 10, 0.9, 256, 7).unwrap();
    for i in 0..1000 {
        s.incr(&format!("item_{:04}", i));
    }
    for i in 0..1000 {
        let c = s.count(&format!("item_{:04}", i));
        // decay may have evicted the fingerprint entirely (count 0)
        if c > 0 {
            assert!(c >= 1);
        }
    }
}

// ==========================================================================
// Category 3: Heap maintenance
// ==========================================================================

#[test]
fn test_top_k_members_dominate_min() {
    let mut s = sketch(3);
    for i in 0..20 {
        for _ in 0..=i {
            s.incr(&format!("item_{:02}", i));
        }
    }
    let top = s.sorted_slice();
    assert_eq!(top.len(), 3);
    let min_count = top.last().unwrap().count;
    for entry in &top {
        assert!(s.count(&entry.item) >= min_count);
    }
}

#[test]
fn test_sorted_slice_is_a_copy() {
    let mut s = sketch(3);
    s.add("a", 5);
    let before = s.sorted_slice();
    s.add("a", 5);
    // earlier snapshot is unaffected
    assert_eq!(before[0].count, 5);
    assert_eq!(s.sorted_slice()[0].count, 10);
}

// ==========================================================================
// Category 4: Window expiry
// ==========================================================================

#[test]
fn test_full_window_wipe() {
    let mut s = sketch(3);
    s.add("a", 100);
    s.add("b", 50);
    s.ticks(10);
    assert_eq!(s.count("a"), 0);
    assert_eq!(s.count("b"), 0);
    assert!(s.sorted_slice().is_empty());
}

#[test]
fn test_overlong_tick_behaves_like_full_wipe() {
    let mut s = sketch(3);
    s.add("a", 100);
    s.ticks(1_000);
    assert_eq!(s.count("a"), 0);
    assert!(s.sorted_slice().is_empty());
}

#[test]
fn test_gradual_expiry() {
    let mut s = sketch(3);
    s.add("a", 3);
    s.ticks(5);
    s.add("a", 7);
    assert_eq!(s.count("a"), 10);
    s.ticks(5);
    // the 3-count slot just left the window
    assert_eq!(s.count("a"), 7);
    s.ticks(5);
    assert_eq!(s.count("a"), 0);
}

#[test]
fn test_heap_follows_expiry() {
    let mut s = sketch(2);
    s.add("old", 100);
    s.ticks(9);
    s.add("new", 5);
    let top = s.sorted_slice();
    assert_eq!(top[0].item, "old");
    s.ticks(1);
    // "old" expired; heap re-derived counts evict it
    let top = s.sorted_slice();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].item, "new");
}

// ==========================================================================
// Category 5: History series
// ==========================================================================

#[test]
fn test_history_length_and_order() {
    let mut s = sketch(3);
    for tick in 0..4u32 {
        s.add("a", tick + 1);
        s.ticks(1);
    }
    let series = s.history_for("a");
    assert_eq!(series.len(), 10);
    // four populated slots, newest last (current tick is empty)
    assert_eq!(&series[5..], &[1, 2, 3, 4, 0]);
}

#[test]
fn test_history_newest_slot_tracks_current_tick() {
    let mut s = sketch(3);
    s.add("a", 6);
    let series = s.history_for("a");
    assert_eq!(*series.last().unwrap(), 6);
}

// ==========================================================================
// Category 6: Decay behavior
// ==========================================================================

#[test]
fn test_heavy_item_survives_light_collisions() {
    // single bucket: everything collides
    let mut s = TopkSketch::with_seed(2, 1, 1, 10, 0.5, 64, 11).unwrap();
    s.add("heavy", 1000);
    for i in 0..100 {
        s.incr(&format!("light_{}", i));
    }
    // decay^1000 is effectively 0: the heavy owner keeps nearly all mass
    assert!(s.count("heavy") > 900);
}

#[test]
fn test_decay_one_always_decrements() {
    let mut s = TopkSketch::with_seed(2, 1, 1, 10, 1.0, 64, 11).unwrap();
    s.add("a", 2);
    s.incr("b");
    // one colliding unit removed one count
    assert_eq!(s.count("a"), 1);
    s.incr("b");
    s.incr("b");
    // second unit killed the owner, third claimed the bucket
    assert_eq!(s.count("a"), 0);
    assert!(s.count("b") >= 1);
}
