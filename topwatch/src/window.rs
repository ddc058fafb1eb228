//! Sliding-window shell over the Top-K sketch
//!
//! Thin facade that fixes the tick geometry from a validated `Config`
//! and re-exposes the sketch operations the pipeline needs. Time itself
//! is advanced by the time driver; the shell only counts ticks.

use crate::common::Result;
use crate::config::Config;
use crate::sketch::{TopItem, TopkSketch};
use std::time::Duration;

/// Windowed Top-K counter: the sketch plus its tick geometry
pub struct SlidingTopk {
    sketch: TopkSketch,
    tick: Duration,
    window: Duration,
}

impl SlidingTopk {
    /// Builds the windowed sketch from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` when the config violates a sketch bound.
    pub fn new(config: &Config) -> Result<Self> {
        let history_len = (config.window.as_nanos() / config.tick.as_nanos()) as usize;
        let sketch = TopkSketch::new(
            config.k,
            config.width,
            config.depth,
            history_len,
            config.decay,
            config.decay_lut_size,
        )?;
        Ok(Self {
            sketch,
            tick: config.tick,
            window: config.window,
        })
    }

    /// Tick duration
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Window duration
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window length in ticks
    pub fn history_len(&self) -> usize {
        self.sketch.history_len()
    }

    /// Adds one occurrence of `item` to the current tick
    pub fn incr(&mut self, item: &str) {
        self.sketch.incr(item);
    }

    /// Adds `delta` occurrences of `item` to the current tick
    pub fn add(&mut self, item: &str, delta: u32) {
        self.sketch.add(item, delta);
    }

    /// Advances the window by `n` ticks
    pub fn ticks(&mut self, n: u64) {
        self.sketch.ticks(n);
    }

    /// Estimated windowed count of `item`
    pub fn count(&self, item: &str) -> u32 {
        self.sketch.count(item)
    }

    /// Sorted Top-K snapshot (count descending, ties by item ascending)
    pub fn sorted_slice(&self) -> Vec<TopItem> {
        self.sketch.sorted_slice()
    }

    /// Per-tick series for `item`, oldest→newest, `history_len` long
    pub fn history_for(&self, item: &str) -> Vec<u32> {
        self.sketch.history_for(item)
    }

    /// True when nothing has been counted yet
    pub fn is_empty(&self) -> bool {
        self.sketch.is_empty()
    }
}
