//! The ingest-and-rank pipeline consumed by the UI collaborator
//!
//! Wires the windowed sketch, the time driver, the incremental ranker
//! and the metrics layer behind one handle. Locking discipline:
//!
//! - sketch and tick clock share one mutex (the sketch-lock), so tick
//!   advancement and event counting are ordered; nothing holds it
//!   across I/O or sleeps
//! - the ranker has its own mutex and takes the sketch-lock *inside*
//!   its callbacks, one bounded critical section per callback
//! - the published Top-K snapshot is an `Arc` swapped under an
//!   `RwLock`, so UI reads never tear and never contend with ingest
//! - the pause gate is a bool under a mutex with a condvar; ingest
//!   drivers block on it at line granularity

use crate::clock::{ClockMode, TickClock};
use crate::common::Result;
use crate::config::Config;
use crate::ingest::Event;
use crate::metrics::PipelineMetrics;
use crate::rank::Ranker;
use crate::sketch::TopItem;
use crate::window::SlidingTopk;
use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Sketch state guarded by the sketch-lock
struct Core {
    window: SlidingTopk,
    clock: TickClock,
}

/// Live Top-K pipeline handle
///
/// Cheap to share via `Arc`; every method takes `&self`.
pub struct TopkPipeline {
    core: Mutex<Core>,
    ranker: Mutex<Ranker>,
    metrics: PipelineMetrics,
    published: RwLock<Arc<Vec<TopItem>>>,
    paused: Mutex<bool>,
    pause_cond: Condvar,
    /// Mirror of the clock mode so the wall ticker can skip without
    /// touching the sketch-lock
    data_clock_active: AtomicBool,
}

impl TopkPipeline {
    /// Builds the pipeline from a configuration, validating it first
    ///
    /// # Errors
    ///
    /// Returns the first violated configuration constraint.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            core: Mutex::new(Core {
                window: SlidingTopk::new(config)?,
                clock: TickClock::new(config.tick),
            }),
            ranker: Mutex::new(Ranker::new(config.k, config.full_refresh, config.partial_size)?),
            metrics: PipelineMetrics::new(config.stats_enabled, config.stats_window),
            published: RwLock::new(Arc::new(Vec::new())),
            paused: Mutex::new(false),
            pause_cond: Condvar::new(),
            data_clock_active: AtomicBool::new(false),
        })
    }

    /// Adds one occurrence of an untimestamped item
    pub fn ingest(&self, item: &str) {
        self.ingest_with_count(item, 1);
    }

    /// Adds `delta` occurrences of an untimestamped item
    pub fn ingest_with_count(&self, item: &str, delta: u32) {
        self.core.lock().window.add(item, delta);
        self.metrics.observe_ingest();
    }

    /// Adds a parsed event, driving the data clock when it carries a
    /// timestamp
    ///
    /// When the event's truncated time exceeds the last tick boundary,
    /// the window is advanced *before* the event is counted, so the
    /// event lands in its own tick slot.
    pub fn ingest_event(&self, event: &Event) {
        {
            let mut core = self.core.lock();
            if let Some(et) = event.timestamp {
                let n = core.clock.advance_data(et);
                if core.clock.mode() == ClockMode::Data {
                    self.data_clock_active.store(true, Ordering::Release);
                }
                if n > 0 {
                    core.window.ticks(n);
                }
            }
            core.window.add(&event.item, event.count);
        }
        self.metrics.observe_ingest();
    }

    /// Advances the sketch to `now` on whichever clock is active
    ///
    /// In data mode `now` is interpreted as a data time; this is the
    /// entry the collaborator uses for explicit advancement.
    pub fn advance_time(&self, now: DateTime<Utc>) {
        let mut core = self.core.lock();
        let n = match core.clock.mode() {
            ClockMode::Wall => core.clock.advance_wall(now),
            ClockMode::Data => core.clock.advance_data(now),
        };
        if n > 0 {
            core.window.ticks(n);
        }
    }

    /// Wall-timer entry: advances the wall clock, a no-op once the
    /// data clock is active
    pub fn wall_tick(&self, now: DateTime<Utc>) {
        if self.data_clock_active.load(Ordering::Acquire) {
            return;
        }
        let mut core = self.core.lock();
        let n = core.clock.advance_wall(now);
        if n > 0 {
            core.window.ticks(n);
        }
    }

    /// Refreshes the ranking and publishes a new snapshot
    ///
    /// Takes the sketch-lock inside the ranker callbacks: once for a
    /// full `sorted_slice` pull, or once per partial count batch.
    pub fn refresh(&self, now: Instant, budget_hint: usize) -> (Arc<Vec<TopItem>>, bool) {
        let (items, did_full) = self.ranker.lock().refresh(
            now,
            budget_hint,
            || self.core.lock().window.sorted_slice(),
            |slice: &mut [TopItem]| {
                let core = self.core.lock();
                for entry in slice.iter_mut() {
                    entry.count = core.window.count(&entry.item);
                }
            },
        );
        let snapshot = Arc::new(items);
        *self.published.write() = Arc::clone(&snapshot);
        self.metrics.observe_topk_refresh();
        (snapshot, did_full)
    }

    /// Last published Top-K snapshot
    pub fn top_k(&self) -> Arc<Vec<TopItem>> {
        Arc::clone(&self.published.read())
    }

    /// Estimated windowed count for one item
    pub fn count(&self, item: &str) -> u32 {
        self.core.lock().window.count(item)
    }

    /// Per-tick series for an item, oldest→newest, for trajectory plots
    pub fn history_for(&self, item: &str) -> Vec<u32> {
        self.core.lock().window.history_for(item)
    }

    /// The metrics layer
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Current clock mode
    pub fn clock_mode(&self) -> ClockMode {
        if self.data_clock_active.load(Ordering::Acquire) {
            ClockMode::Data
        } else {
            ClockMode::Wall
        }
    }

    /// Stops ingest drivers at their next safe point
    pub fn pause(&self) {
        *self.paused.lock() = true;
    }

    /// Wakes paused ingest drivers
    pub fn resume(&self) {
        let mut paused = self.paused.lock();
        *paused = false;
        self.pause_cond.notify_all();
    }

    /// Whether the pause gate is closed
    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    /// Blocks the calling ingest driver while paused
    pub fn block_while_paused(&self) {
        let mut paused = self.paused.lock();
        while *paused {
            self.pause_cond.wait(&mut paused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn config() -> Config {
        Config {
            k: 3,
            width: 64,
            depth: 3,
            window: Duration::from_secs(10),
            tick: Duration::from_secs(1),
            full_refresh: Duration::ZERO,
            ..Config::default()
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_ingest_and_refresh() {
        let p = TopkPipeline::new(&config()).unwrap();
        p.ingest("a");
        p.ingest("a");
        p.ingest("b");
        let (items, did_full) = p.refresh(Instant::now(), 0);
        assert!(did_full);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item, "a");
        assert_eq!(items[0].count, 2);
        assert_eq!(*p.top_k(), *items);
    }

    #[test]
    fn test_timestamped_event_flips_clock() {
        let p = TopkPipeline::new(&config()).unwrap();
        assert_eq!(p.clock_mode(), ClockMode::Wall);
        p.ingest_event(&Event {
            item: "x".to_string(),
            count: 1,
            timestamp: Some(at(0)),
        });
        assert_eq!(p.clock_mode(), ClockMode::Data);
        // wall ticks are no-ops now
        p.wall_tick(at(1_000_000));
        assert_eq!(p.count("x"), 1);
    }

    #[test]
    fn test_pause_gate() {
        let p = TopkPipeline::new(&config()).unwrap();
        assert!(!p.is_paused());
        p.pause();
        assert!(p.is_paused());
        p.resume();
        assert!(!p.is_paused());
        // resumed gate lets callers straight through
        p.block_while_paused();
    }

    #[test]
    fn test_metrics_count_ingests() {
        let p = TopkPipeline::new(&config()).unwrap();
        p.ingest("a");
        p.ingest_with_count("b", 5);
        assert_eq!(p.metrics().snapshot().records, 2);
    }
}
