//! Pipeline configuration and validation
//!
//! All options a collaborator can set, with defaults matching the
//! interactive tool. Validation fails fast on the first violated
//! constraint so startup errors are precise.

use crate::common::validation::{
    validate_decay, validate_decay_lut_size, validate_k, validate_stats_window,
    validate_width_depth, validate_window_tick,
};
use crate::common::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Input format for the ingest drivers; mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// One event per line; the whole line is the item
    Text,
    /// `«item» - - [«timestamp»] ...` access-log lines
    AccessLog,
    /// One JSON record per line with `item`/`count`/`timestamp` fields
    Records,
}

/// Timestamp layout for access-log and string-timestamp records,
/// in chrono strftime syntax (common log format)
pub const DEFAULT_TIMESTAMP_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// All pipeline options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Top-K size (>= 1)
    pub k: usize,
    /// Sketch buckets per row
    pub width: usize,
    /// Sketch rows / independent hash functions
    pub depth: usize,
    /// Collision decay base in [0, 1]
    pub decay: f64,
    /// Number of precomputed `decay^n` thresholds (>= 1)
    pub decay_lut_size: usize,
    /// Sliding-window horizon; must be a multiple of `tick`
    pub window: Duration,
    /// Tick duration; the window advances one slot per tick
    pub tick: Duration,
    /// Optional sleep between ingested events
    pub pace: Duration,
    /// Replay the stream at data-timestamp pace
    pub replay: bool,
    /// Replay speed multiplier (> 0)
    pub replay_speed: f64,
    /// Cap on a single replay sleep; zero means uncapped
    pub replay_max_sleep: Duration,
    /// Stop after this many input lines; zero means unlimited
    pub max_lines: u64,
    /// Interval between full ranking rebuilds; zero means every refresh
    pub full_refresh: Duration,
    /// Partial count-refresh budget per call; zero means auto
    pub partial_size: usize,
    /// Record ingest/freshness statistics
    pub stats_enabled: bool,
    /// Sample-ring length for the statistics (>= 16)
    pub stats_window: usize,
    /// chrono strftime layout for string timestamps
    pub timestamp_layout: String,
    /// Input format for the ingest drivers
    pub format: InputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: 10,
            width: 1024,
            depth: 4,
            decay: 0.9,
            decay_lut_size: 256,
            window: Duration::from_secs(60),
            tick: Duration::from_secs(1),
            pace: Duration::ZERO,
            replay: false,
            replay_speed: 1.0,
            replay_max_sleep: Duration::ZERO,
            max_lines: 0,
            full_refresh: Duration::from_secs(2),
            partial_size: 0,
            stats_enabled: true,
            stats_window: 64,
            timestamp_layout: DEFAULT_TIMESTAMP_LAYOUT.to_string(),
            format: InputFormat::Text,
        }
    }
}

impl Config {
    /// Checks every constraint, returning the first violation
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for out-of-range values,
    /// `IncompatibleOptions` for replay without timestamped input.
    pub fn validate(&self) -> Result<()> {
        validate_k(self.k)?;
        validate_width_depth(self.width, self.depth)?;
        validate_decay(self.decay)?;
        validate_decay_lut_size(self.decay_lut_size)?;
        validate_window_tick(self.window, self.tick)?;
        validate_stats_window(self.stats_window)?;

        if !(self.replay_speed > 0.0) {
            return Err(ConfigError::InvalidParameter {
                param: "replay_speed".to_string(),
                value: self.replay_speed.to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.replay && self.format == InputFormat::Text {
            return Err(ConfigError::IncompatibleOptions {
                reason: "replay requires access_log or records input (text lines carry no timestamp)"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Window length in ticks; only meaningful after `validate`
    pub fn history_len(&self) -> usize {
        (self.window.as_nanos() / self.tick.as_nanos()) as usize
    }
}
