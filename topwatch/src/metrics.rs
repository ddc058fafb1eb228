//! Rolling pipeline statistics: ingest rate and ranking freshness
//!
//! Counters are lock-free atomics updated on every event; the sample
//! rings sit behind short mutexes and are only touched by `observe_*`
//! and `snapshot`. Everything short-circuits when stats are disabled.

use crate::common::RollingRing;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Complete statistics snapshot for the collaborator's status line
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Total successfully ingested events
    pub records: u64,
    /// Ingest rate over the recent sample window (events/sec)
    pub ingest_rps: f64,
    /// Time since the last ingested event
    pub ingest_lag: Duration,
    /// p95 of (refresh time − last ingest time) over the sample window
    pub rank_lag_p95: Duration,
    /// Number of rank-lag samples currently held
    pub rank_lag_samples: usize,
}

impl MetricsSnapshot {
    fn zero() -> Self {
        Self {
            records: 0,
            ingest_rps: 0.0,
            ingest_lag: Duration::ZERO,
            rank_lag_p95: Duration::ZERO,
            rank_lag_samples: 0,
        }
    }
}

/// Bounded-memory rolling statistics over ingest and refresh
pub struct PipelineMetrics {
    enabled: bool,
    /// Monotonic anchor; all ring samples are nanoseconds since this
    anchor: Instant,
    ingested_records: AtomicU64,
    /// Nanos-since-anchor of the last ingest, offset by 1 so 0 means "never"
    last_ingest_ns: AtomicU64,
    ingest_ring: Mutex<RollingRing<u64>>,
    rank_lag_ring: Mutex<RollingRing<u64>>,
}

impl PipelineMetrics {
    /// Creates the metrics layer
    ///
    /// `stats_window` is the ring length for both sample windows; the
    /// config layer enforces its floor of 16.
    pub fn new(enabled: bool, stats_window: usize) -> Self {
        Self {
            enabled,
            anchor: Instant::now(),
            ingested_records: AtomicU64::new(0),
            last_ingest_ns: AtomicU64::new(0),
            ingest_ring: Mutex::new(RollingRing::new(stats_window)),
            rank_lag_ring: Mutex::new(RollingRing::new(stats_window)),
        }
    }

    /// Whether observers record anything
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Records one successfully ingested event
    pub fn observe_ingest(&self) {
        if !self.enabled {
            return;
        }
        self.observe_ingest_at(self.now_ns());
    }

    /// Records a Top-K refresh completing now
    pub fn observe_topk_refresh(&self) {
        if !self.enabled {
            return;
        }
        self.observe_topk_refresh_at(self.now_ns());
    }

    /// Builds a snapshot; all zeros when disabled
    pub fn snapshot(&self) -> MetricsSnapshot {
        if !self.enabled {
            return MetricsSnapshot::zero();
        }
        self.snapshot_at(self.now_ns())
    }

    fn now_ns(&self) -> u64 {
        // +1 keeps 0 reserved for "never ingested"
        self.anchor.elapsed().as_nanos() as u64 + 1
    }

    fn observe_ingest_at(&self, now_ns: u64) {
        self.ingested_records.fetch_add(1, Ordering::Relaxed);
        self.last_ingest_ns.store(now_ns, Ordering::Relaxed);
        self.ingest_ring.lock().push(now_ns);
    }

    fn observe_topk_refresh_at(&self, now_ns: u64) {
        let last = self.last_ingest_ns.load(Ordering::Relaxed);
        if last == 0 {
            // nothing ingested yet: freshness is undefined, skip the sample
            return;
        }
        self.rank_lag_ring.lock().push(now_ns.saturating_sub(last));
    }

    fn snapshot_at(&self, now_ns: u64) -> MetricsSnapshot {
        let records = self.ingested_records.load(Ordering::Relaxed);
        let last = self.last_ingest_ns.load(Ordering::Relaxed);

        let ingest_rps = {
            let ring = self.ingest_ring.lock();
            match (ring.oldest(), ring.newest()) {
                (Some(oldest), Some(newest)) if ring.len() >= 2 && newest > oldest => {
                    (ring.len() as f64 - 1.0) / ((newest - oldest) as f64 / 1e9)
                }
                _ => 0.0,
            }
        };

        let ingest_lag = if last == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(now_ns.saturating_sub(last))
        };

        let (rank_lag_p95, rank_lag_samples) = {
            let ring = self.rank_lag_ring.lock();
            let mut samples = ring.to_vec();
            let n = samples.len();
            if n == 0 {
                (Duration::ZERO, 0)
            } else {
                samples.sort_unstable();
                let idx = (0.95 * (n as f64 - 1.0)).floor() as usize;
                (Duration::from_nanos(samples[idx]), n)
            }
        };

        MetricsSnapshot {
            records,
            ingest_rps,
            ingest_lag,
            rank_lag_p95,
            rank_lag_samples,
        }
    }
}
