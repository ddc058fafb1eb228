//! Sliding-window Top-K sketch: count-min grid with probabilistic decay
//!
//! The structure keeps a `depth × width` grid of buckets. Each bucket is
//! owned by one item fingerprint at a time and holds a fixed-length ring
//! of per-tick counts covering the last `history_len` ticks. On a hash
//! collision the incumbent count is probabilistically decremented with
//! probability `decay^count`, so small flows are evicted while heavy
//! hitters keep their buckets.
//!
//! A min-heap of at most `k` candidates caches the current Top-K with
//! aggregated counts, so ranking never scans the grid.
//!
//! # Algorithm Overview
//!
//! For each update of item `x` by `Δ`:
//! 1. Hash `x` to one bucket per row plus a 64-bit fingerprint
//! 2. Rows owned by `x` (or empty) absorb `Δ` into the current tick slot
//! 3. Colliding rows run the decay lottery once per unit; a bucket whose
//!    count reaches 0 is reassigned to `x`
//! 4. The new estimate (min over owning rows) is offered to the heap
//!
//! Advancing time by `n` ticks rotates every bucket ring, dropping the
//! `n` oldest slots, and re-evaluates the heap against the surviving
//! counts.
//!
//! # Time Complexity
//!
//! - Update: O(depth + k) (heap re-offer dominates for tracked items)
//! - Point query: O(depth)
//! - Tick advance: O(depth × width + k × depth)
//!
//! # References
//!
//! - Yang et al. "HeavyKeeper: An Accurate Algorithm for Finding Top-k
//!   Elephant Flows" (USENIX ATC 2018)
//! - Cormode, Muthukrishnan. "An Improved Data Stream Summary: The
//!   Count-Min Sketch and its Applications" (2005)

use crate::common::hash::{fingerprint, row_hash};
use crate::common::validation::{
    validate_decay, validate_decay_lut_size, validate_k, validate_width_depth,
};
use crate::common::{ConfigError, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// One ranked entry surfaced by the sketch or the ranker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopItem {
    /// The event string
    pub item: String,
    /// Estimated count over the current window
    pub count: u32,
}

/// A single bucket: fingerprint ownership plus a ring of tick counts
#[derive(Debug, Clone)]
struct Bucket {
    /// Fingerprint of the item currently owning this bucket
    fingerprint: u64,
    /// Per-tick counts; `slots[first]` is the oldest tick
    slots: Box<[u32]>,
    /// Index of the oldest tick slot
    first: usize,
    /// Cached sum of `slots`
    total: u32,
}

impl Bucket {
    fn new(history_len: usize) -> Self {
        Self {
            fingerprint: 0,
            slots: vec![0u32; history_len].into_boxed_slice(),
            first: 0,
            total: 0,
        }
    }

    /// Index of the newest (current-tick) slot
    #[inline]
    fn current(&self) -> usize {
        (self.first + self.slots.len() - 1) % self.slots.len()
    }

    /// Adds `delta` to the current tick slot
    fn add(&mut self, delta: u32) {
        let idx = self.current();
        self.slots[idx] = self.slots[idx].saturating_add(delta);
        self.total = self.total.saturating_add(delta);
    }

    /// Removes one unit from the newest non-zero slot
    ///
    /// Caller guarantees `total > 0`.
    fn decrement_one(&mut self) {
        let len = self.slots.len();
        for j in (0..len).rev() {
            let idx = (self.first + j) % len;
            if self.slots[idx] > 0 {
                self.slots[idx] -= 1;
                self.total -= 1;
                return;
            }
        }
        debug_assert!(false, "decrement_one called on empty bucket");
    }

    /// Rotates the ring forward by `n` ticks, expiring the oldest slots
    fn advance(&mut self, n: u64) {
        let len = self.slots.len();
        if n >= len as u64 {
            self.slots.fill(0);
            self.first = 0;
            self.total = 0;
            return;
        }
        for _ in 0..n {
            self.total -= self.slots[self.first];
            self.slots[self.first] = 0;
            self.first = (self.first + 1) % len;
        }
    }

    /// Counts oldest→newest
    fn history(&self) -> impl Iterator<Item = u32> + '_ {
        let len = self.slots.len();
        (0..len).map(move |j| self.slots[(self.first + j) % len])
    }
}

/// Entry in the Top-K min-heap
#[derive(Clone, Debug, Eq, PartialEq)]
struct HeapEntry {
    count: u32,
    item: String,
    fingerprint: u64,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Compare by count, then by item for determinism
        self.count
            .cmp(&other.count)
            .then_with(|| self.item.cmp(&other.item))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Count-min sketch with heavy-keeper decay and per-tick count rings
///
/// Bounded memory: `depth × width` buckets of `history_len` slots each,
/// plus a heap of at most `k` tracked items.
#[derive(Clone)]
pub struct TopkSketch {
    /// Number of top items to track
    k: usize,
    /// Buckets per row
    width: usize,
    /// Number of rows / independent hash functions
    depth: usize,
    /// Window length in ticks
    history_len: usize,
    /// Precomputed `decay^n` thresholds
    decay_lut: Box<[f64]>,
    /// Bucket grid: depth × width
    rows: Vec<Vec<Bucket>>,
    /// Min-heap of current Top-K candidates
    heap: BinaryHeap<Reverse<HeapEntry>>,
    /// RNG for the decay lottery
    rng: SmallRng,
}

impl TopkSketch {
    /// Creates a sketch
    ///
    /// # Arguments
    ///
    /// * `k` - Top-K size (>= 1)
    /// * `width` - buckets per row
    /// * `depth` - independent hash rows
    /// * `history_len` - window length in ticks (window / tick)
    /// * `decay` - collision decay base in [0, 1]
    /// * `decay_lut_size` - number of precomputed `decay^n` thresholds
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` when any bound is violated.
    pub fn new(
        k: usize,
        width: usize,
        depth: usize,
        history_len: usize,
        decay: f64,
        decay_lut_size: usize,
    ) -> Result<Self> {
        Self::with_seed(
            k,
            width,
            depth,
            history_len,
            decay,
            decay_lut_size,
            rand::rng().random(),
        )
    }

    /// Creates a sketch with a fixed RNG seed for reproducible tests
    #[allow(clippy::too_many_arguments)]
    pub fn with_seed(
        k: usize,
        width: usize,
        depth: usize,
        history_len: usize,
        decay: f64,
        decay_lut_size: usize,
        seed: u64,
    ) -> Result<Self> {
        validate_k(k)?;
        validate_width_depth(width, depth)?;
        validate_decay(decay)?;
        validate_decay_lut_size(decay_lut_size)?;
        if history_len == 0 {
            return Err(ConfigError::InvalidParameter {
                param: "history_len".to_string(),
                value: history_len.to_string(),
                constraint: "must be >= 1".to_string(),
            });
        }

        let decay_lut: Box<[f64]> = (0..decay_lut_size)
            .map(|n| decay.powi(n as i32))
            .collect();

        let rows = (0..depth)
            .map(|_| (0..width).map(|_| Bucket::new(history_len)).collect())
            .collect();

        Ok(Self {
            k,
            width,
            depth,
            history_len,
            decay_lut,
            rows,
            heap: BinaryHeap::with_capacity(k + 1),
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Window length in ticks
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Top-K size
    pub fn k(&self) -> usize {
        self.k
    }

    /// Adds one occurrence of `item`
    pub fn incr(&mut self, item: &str) {
        self.add(item, 1);
    }

    /// Adds `delta` occurrences of `item`
    pub fn add(&mut self, item: &str, delta: u32) {
        if delta == 0 {
            return;
        }
        let bytes = item.as_bytes();
        let fp = fingerprint(bytes);

        for row in 0..self.depth {
            let idx = (row_hash(bytes, row) % self.width as u64) as usize;
            let lut = &self.decay_lut;
            let bucket = &mut self.rows[row][idx];

            if bucket.fingerprint == fp || bucket.total == 0 {
                bucket.fingerprint = fp;
                bucket.add(delta);
                continue;
            }

            // Collision: run the decay lottery once per unit. A unit that
            // drives the incumbent to zero claims the bucket and is still
            // counted, together with any units left over.
            let mut units = delta;
            while units > 0 {
                let n = (bucket.total as usize).min(lut.len() - 1);
                if self.rng.random::<f64>() < lut[n] {
                    bucket.decrement_one();
                    if bucket.total == 0 {
                        bucket.fingerprint = fp;
                        break;
                    }
                }
                units -= 1;
            }
            if bucket.fingerprint == fp && units > 0 {
                bucket.add(units);
            }
        }

        let estimate = self.count_fp(bytes, fp);
        if estimate > 0 {
            self.offer(item, fp, estimate);
        }
    }

    /// Estimated windowed count of `item`
    ///
    /// Minimum over the rows whose bucket still owns the item's
    /// fingerprint; 0 when no row matches.
    pub fn count(&self, item: &str) -> u32 {
        let bytes = item.as_bytes();
        self.count_fp(bytes, fingerprint(bytes))
    }

    fn count_fp(&self, bytes: &[u8], fp: u64) -> u32 {
        let mut min: Option<u32> = None;
        for row in 0..self.depth {
            let idx = (row_hash(bytes, row) % self.width as u64) as usize;
            let bucket = &self.rows[row][idx];
            if bucket.fingerprint == fp {
                min = Some(match min {
                    Some(m) => m.min(bucket.total),
                    None => bucket.total,
                });
            }
        }
        min.unwrap_or(0)
    }

    /// Advances the window by `n` ticks
    ///
    /// Rotates every bucket ring so the `n` oldest tick slots expire,
    /// then re-derives every heap entry's count from the surviving
    /// slots, evicting entries whose estimate drops to 0. `n == 0` is a
    /// no-op; `n >= history_len` wipes the whole window.
    pub fn ticks(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        for row in &mut self.rows {
            for bucket in row.iter_mut() {
                bucket.advance(n);
            }
        }

        let entries: Vec<HeapEntry> = self.heap.drain().map(|Reverse(e)| e).collect();
        for mut entry in entries {
            entry.count = self.count_fp(entry.item.as_bytes(), entry.fingerprint);
            if entry.count > 0 {
                self.heap.push(Reverse(entry));
            }
        }
    }

    /// Snapshot of the tracked Top-K, sorted by count descending,
    /// ties broken by item ascending
    pub fn sorted_slice(&self) -> Vec<TopItem> {
        let mut entries: Vec<TopItem> = self
            .heap
            .iter()
            .map(|Reverse(e)| TopItem {
                item: e.item.clone(),
                count: e.count,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item.cmp(&b.item)));
        entries
    }

    /// Per-tick series for `item`, oldest→newest
    ///
    /// Element-wise maximum across the rows whose bucket still owns the
    /// item's fingerprint; all zeros when no row matches. Always
    /// `history_len` long.
    pub fn history_for(&self, item: &str) -> Vec<u32> {
        let bytes = item.as_bytes();
        let fp = fingerprint(bytes);
        let mut series = vec![0u32; self.history_len];
        for row in 0..self.depth {
            let idx = (row_hash(bytes, row) % self.width as u64) as usize;
            let bucket = &self.rows[row][idx];
            if bucket.fingerprint == fp {
                for (acc, v) in series.iter_mut().zip(bucket.history()) {
                    *acc = (*acc).max(v);
                }
            }
        }
        series
    }

    /// Number of items currently tracked in the heap
    pub fn tracked(&self) -> usize {
        self.heap.len()
    }

    /// True when nothing has been counted yet
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offers `(item, fp, count)` to the min-heap
    ///
    /// In-place update when tracked; otherwise push while below `k`, or
    /// eject the minimum when the new estimate is strictly greater.
    fn offer(&mut self, item: &str, fp: u64, count: u32) {
        let tracked = self
            .heap
            .iter()
            .any(|Reverse(e)| e.fingerprint == fp && e.item == item);

        if tracked {
            let mut entries: Vec<HeapEntry> = self.heap.drain().map(|Reverse(e)| e).collect();
            for entry in &mut entries {
                if entry.fingerprint == fp && entry.item == item {
                    entry.count = count;
                }
            }
            self.heap.extend(entries.into_iter().map(Reverse));
            return;
        }

        if self.heap.len() < self.k {
            self.heap.push(Reverse(HeapEntry {
                count,
                item: item.to_string(),
                fingerprint: fp,
            }));
        } else if let Some(Reverse(min)) = self.heap.peek() {
            if count > min.count {
                self.heap.pop();
                self.heap.push(Reverse(HeapEntry {
                    count,
                    item: item.to_string(),
                    fingerprint: fp,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sketch(k: usize) -> TopkSketch {
        TopkSketch::with_seed(k, 64, 3, 10, 0.9, 256, 42).unwrap()
    }

    #[test]
    fn test_invalid_params() {
        assert!(TopkSketch::new(0, 64, 3, 10, 0.9, 256).is_err());
        assert!(TopkSketch::new(5, 0, 3, 10, 0.9, 256).is_err());
        assert!(TopkSketch::new(5, 64, 0, 10, 0.9, 256).is_err());
        assert!(TopkSketch::new(5, 64, 3, 0, 0.9, 256).is_err());
        assert!(TopkSketch::new(5, 64, 3, 10, 1.5, 256).is_err());
        assert!(TopkSketch::new(5, 64, 3, 10, 0.9, 0).is_err());
    }

    #[test]
    fn test_incr_and_count() {
        let mut s = sketch(3);
        for _ in 0..100 {
            s.incr("a");
        }
        assert_eq!(s.count("a"), 100);
        assert_eq!(s.count("never-seen"), 0);
    }

    #[test]
    fn test_add_matches_repeated_incr() {
        let mut a = sketch(3);
        let mut b = sketch(3);
        a.incr("x");
        a.incr("x");
        b.add("x", 2);
        assert_eq!(a.count("x"), b.count("x"));
        assert_eq!(a.sorted_slice(), b.sorted_slice());
    }

    #[test]
    fn test_sorted_slice_order() {
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
        let top = s.sorted_slice();
        assert_eq!(top.len(), 3);
        assert_eq!((top[0].item.as_str(), top[0].count), ("a", 100));
        assert_eq!((top[1].item.as_str(), top[1].count), ("b", 50));
        assert_eq!((top[2].item.as_str(), top[2].count), ("c", 10));
    }

    #[test]
    fn test_ties_break_by_item_ascending() {
        let mut s = sketch(4);
        for item in ["delta", "alpha", "charlie", "bravo"] {
            s.add(item, 7);
        }
        let top = s.sorted_slice();
        let names: Vec<&str> = top.iter().map(|t| t.item.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie", "delta"]);
    }

    #[test]
    fn test_heap_ejects_strictly_greater() {
        let mut s = sketch(2);
        s.add("a", 10);
        s.add("b", 5);
        // equal to the min: no ejection
        s.add("c", 5);
        let names: Vec<String> = s.sorted_slice().into_iter().map(|t| t.item).collect();
        assert_eq!(names, vec!["a", "b"]);
        // strictly greater: ejects b
        s.add("c", 1);
        let names: Vec<String> = s.sorted_slice().into_iter().map(|t| t.item).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_ticks_expire_window() {
        let mut s = sketch(3);
        s.add("a", 100);
        s.ticks(10);
        assert_eq!(s.count("a"), 0);
        assert!(s.sorted_slice().is_empty());
    }

    #[test]
    fn test_ticks_partial_expiry() {
        let mut s = sketch(3);
        s.add("a", 4);
        s.ticks(3);
        s.add("a", 6);
        // both tick slots still inside the 10-tick window
        assert_eq!(s.count("a"), 10);
        s.ticks(7);
        // the slot holding 4 has expired
        assert_eq!(s.count("a"), 6);
    }

    #[test]
    fn test_ticks_zero_is_noop() {
        let mut s = sketch(3);
        s.add("a", 5);
        let before = s.sorted_slice();
        let count_before = s.count("a");
        s.ticks(0);
        assert_eq!(s.sorted_slice(), before);
        assert_eq!(s.count("a"), count_before);
    }

    #[test]
    fn test_history_series() {
        let mut s = sketch(3);
        s.add("a", 4);
        s.ticks(1);
        s.add("a", 6);
        let series = s.history_for("a");
        assert_eq!(series.len(), 10);
        assert_eq!(series[9], 6);
        assert_eq!(series[8], 4);
        assert_eq!(series[..8].iter().sum::<u32>(), 0);
    }

    #[test]
    fn test_history_unknown_item_is_zeroed() {
        let s = sketch(3);
        let series = s.history_for("ghost");
        assert_eq!(series, vec![0u32; 10]);
    }

    #[test]
    fn test_empty_sketch() {
        let s = sketch(3);
        assert!(s.is_empty());
        assert!(s.sorted_slice().is_empty());
        assert_eq!(s.count("a"), 0);
    }

    #[test]
    fn test_decay_evicts_small_flows() {
        // width 1 forces every item into the same bucket per row
        let mut s = TopkSketch::with_seed(2, 1, 1, 10, 1.0, 256, 7).unwrap();
        s.add("heavy", 3);
        // decay 1.0 decrements on every colliding unit: 4 units kill 3
        // and the survivor claims the bucket
        s.add("intruder", 4);
        assert_eq!(s.count("heavy"), 0);
        assert!(s.count("intruder") >= 1);
    }
}
