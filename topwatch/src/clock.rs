//! Time driver: wall-clock vs data-clock tick advancement, replay pacing
//!
//! The sketch's notion of "now" only moves through `ticks(n)`. This
//! module decides how many ticks to apply for a given observation of
//! time. Two mutually exclusive sources exist: a wall-clock timer, and
//! event timestamps extracted by the ingest drivers. The first valid
//! event timestamp flips the clock to data mode permanently; wall ticks
//! become no-ops from then on.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::info;

/// Source of "now" for tick advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Ticks follow the host clock
    Wall,
    /// Ticks follow event timestamps from the stream
    Data,
}

/// Epoch nanoseconds of `t`, saturating far outside the chrono range
fn epoch_nanos(t: DateTime<Utc>) -> i64 {
    t.timestamp_nanos_opt()
        .unwrap_or_else(|| t.timestamp().saturating_mul(1_000_000_000))
}

/// Coalescing tick counter over a truncated timeline
///
/// Tracks the last tick boundary seen and converts any later instant
/// into the number of whole ticks elapsed since. Lives under the same
/// lock as the sketch so tick advancement and event counting are
/// ordered.
pub struct TickClock {
    tick_nanos: i64,
    /// Last tick boundary (truncated epoch nanos); `None` until the
    /// first observation anchors the timeline
    last: Option<i64>,
    mode: ClockMode,
}

impl TickClock {
    /// Creates a wall-mode clock with the given tick duration
    ///
    /// `tick` must have been validated as nonzero.
    pub fn new(tick: Duration) -> Self {
        Self {
            tick_nanos: tick.as_nanos() as i64,
            last: None,
            mode: ClockMode::Wall,
        }
    }

    /// Current advancement mode
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Truncates `t` down to its tick boundary
    fn truncate(&self, t: DateTime<Utc>) -> i64 {
        let nanos = epoch_nanos(t);
        nanos - nanos.rem_euclid(self.tick_nanos)
    }

    fn advance(&mut self, t: DateTime<Utc>) -> u64 {
        let trunc = self.truncate(t);
        match self.last {
            None => {
                self.last = Some(trunc);
                0
            }
            Some(last) if trunc > last => {
                self.last = Some(trunc);
                ((trunc - last) / self.tick_nanos) as u64
            }
            Some(_) => 0,
        }
    }

    /// Wall-clock advancement; returns the ticks to apply
    ///
    /// No-op once data mode is active.
    pub fn advance_wall(&mut self, now: DateTime<Utc>) -> u64 {
        if self.mode == ClockMode::Data {
            return 0;
        }
        self.advance(now)
    }

    /// Data-clock advancement from an event timestamp
    ///
    /// The first call flips the clock to data mode and re-anchors the
    /// timeline on the event's tick boundary, discarding the wall
    /// baseline.
    pub fn advance_data(&mut self, event_time: DateTime<Utc>) -> u64 {
        if self.mode == ClockMode::Wall {
            self.mode = ClockMode::Data;
            self.last = None;
            info!("event timestamps detected, switching to data clock");
        }
        self.advance(event_time)
    }
}

/// Inter-event sleep calculator for replay mode
///
/// Scales the gap between consecutive event timestamps by `1/speed`,
/// optionally capping each sleep. Out-of-order timestamps produce a
/// zero sleep.
pub struct ReplayPacer {
    speed: f64,
    max_sleep: Duration,
    prev: Option<DateTime<Utc>>,
}

impl ReplayPacer {
    /// Creates a pacer
    ///
    /// `speed` must be positive (validated by `Config`); `max_sleep` of
    /// zero means uncapped.
    pub fn new(speed: f64, max_sleep: Duration) -> Self {
        Self {
            speed,
            max_sleep,
            prev: None,
        }
    }

    /// Sleep to take *before* ingesting the event stamped `event_time`
    pub fn pause_for(&mut self, event_time: DateTime<Utc>) -> Duration {
        let sleep = match self.prev {
            None => Duration::ZERO,
            Some(prev) => {
                let gap = event_time.signed_duration_since(prev);
                match gap.to_std() {
                    Ok(gap) => {
                        let scaled = Duration::from_secs_f64(gap.as_secs_f64() / self.speed);
                        if !self.max_sleep.is_zero() && scaled > self.max_sleep {
                            self.max_sleep
                        } else {
                            scaled
                        }
                    }
                    // negative gap: out-of-order event
                    Err(_) => Duration::ZERO,
                }
            }
        };
        self.prev = Some(event_time);
        sleep
    }
}
