//! Incremental Top-K ranker
//!
//! A full sorted pull from the sketch heap plus a per-item count query
//! are each O(K) inside the sketch-lock; doing both every UI frame can
//! starve ingest. The ranker amortizes the cost: membership churn is
//! captured by a periodic full rebuild, while a rotating, budgeted slice
//! of the visible items gets its counts refreshed on every other call.
//!
//! The two callbacks exist so the sketch-lock can be taken *inside* the
//! refresh rather than around it; the ranker itself owns no lock.

use crate::common::validation::validate_k;
use crate::common::Result;
use crate::sketch::TopItem;
use std::time::{Duration, Instant};

/// Budgeted Top-K view refresher
///
/// `items` is the published ordering: sorted descending by count with
/// ties broken ascending by item, never containing zero-count entries.
pub struct Ranker {
    k: usize,
    /// Interval between full rebuilds; zero means full on every call
    full_refresh_interval: Duration,
    /// Fixed partial budget; zero selects the automatic budget
    partial_size: usize,
    /// Derived budget used when both `partial_size` and the hint are zero
    auto_budget: usize,
    last_full_refresh: Option<Instant>,
    items: Vec<TopItem>,
    partial_cursor: usize,
}

impl Ranker {
    /// Creates a ranker
    ///
    /// # Arguments
    ///
    /// * `k` - Top-K size (>= 1)
    /// * `full_refresh_interval` - zero forces a full rebuild every call
    /// * `partial_size` - per-call count-refresh budget; zero means auto
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` when `k` is out of bounds.
    pub fn new(k: usize, full_refresh_interval: Duration, partial_size: usize) -> Result<Self> {
        validate_k(k)?;
        let floor = if k >= 10 { 10 } else { 1 };
        let auto_budget = (k / 2).clamp(floor, 100).min(k);
        Ok(Self {
            k,
            full_refresh_interval,
            partial_size,
            auto_budget,
            last_full_refresh: None,
            items: Vec::new(),
            partial_cursor: 0,
        })
    }

    /// Top-K size
    pub fn k(&self) -> usize {
        self.k
    }

    /// The derived automatic partial budget
    pub fn auto_budget(&self) -> usize {
        self.auto_budget
    }

    /// Refreshes the ranking and returns `(snapshot, did_full)`
    ///
    /// Performs a full rebuild via `sorted_fn` when the view is empty,
    /// no full refresh has happened yet, or `full_refresh_interval` has
    /// elapsed (or is zero). Otherwise refreshes counts for a rotating
    /// window of at most `limit` items via `update_counts_fn`, where
    /// `limit` is `partial_size` when set, else `budget_hint` when
    /// nonzero, else the automatic budget; the window wraps around the
    /// end of the view in two segments.
    ///
    /// After a partial pass the view is stably re-sorted (preserving the
    /// lexicographic tie order of the last full rebuild) and trailing
    /// zero-count entries are trimmed.
    pub fn refresh<F, G>(
        &mut self,
        now: Instant,
        budget_hint: usize,
        sorted_fn: F,
        mut update_counts_fn: G,
    ) -> (Vec<TopItem>, bool)
    where
        F: FnOnce() -> Vec<TopItem>,
        G: FnMut(&mut [TopItem]),
    {
        let need_full = self.items.is_empty()
            || self.last_full_refresh.is_none()
            || self.full_refresh_interval.is_zero()
            || now.duration_since(self.last_full_refresh.unwrap_or(now))
                >= self.full_refresh_interval;

        if need_full {
            let mut items = sorted_fn();
            items.truncate(self.k);
            self.items = items;
            self.partial_cursor = 0;
            self.last_full_refresh = Some(now);
            return (self.items.clone(), true);
        }

        let len = self.items.len();
        let limit = if self.partial_size > 0 {
            self.partial_size.min(len)
        } else {
            let budget = if budget_hint > 0 {
                budget_hint
            } else {
                self.auto_budget
            };
            budget.min(len)
        };

        let cursor = self.partial_cursor % len;
        if limit == len {
            update_counts_fn(&mut self.items);
        } else if cursor + limit <= len {
            update_counts_fn(&mut self.items[cursor..cursor + limit]);
        } else {
            // Window wraps: tail segment, then head segment
            let head = (cursor + limit) - len;
            update_counts_fn(&mut self.items[cursor..]);
            update_counts_fn(&mut self.items[..head]);
        }
        self.partial_cursor = (cursor + limit) % len;

        self.items
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item.cmp(&b.item)));
        while self.items.last().is_some_and(|t| t.count == 0) {
            self.items.pop();
        }
        if self.items.is_empty() {
            self.partial_cursor = 0;
        }

        (self.items.clone(), false)
    }
}
