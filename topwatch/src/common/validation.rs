//! Parameter bounds checking shared by `Config` and sketch constructors

use crate::common::{ConfigError, Result};
use std::time::Duration;

/// Upper bound on either sketch dimension (2^20 buckets)
pub const MAX_DIM: usize = 1 << 20;

/// Upper bound on tracked Top-K size
pub const MAX_K: usize = 1 << 16;

/// Minimum metrics sample-window length
pub const MIN_STATS_WINDOW: usize = 16;

/// Validate that the Top-K size is within [1, `MAX_K`]
pub fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(ConfigError::InvalidParameter {
            param: "k".to_string(),
            value: k.to_string(),
            constraint: "must be >= 1".to_string(),
        });
    }
    if k > MAX_K {
        return Err(ConfigError::InvalidParameter {
            param: "k".to_string(),
            value: k.to_string(),
            constraint: format!("must not exceed {}", MAX_K),
        });
    }
    Ok(())
}

/// Validate that width and depth are reasonable for the sketch grid
pub fn validate_width_depth(width: usize, depth: usize) -> Result<()> {
    if width == 0 {
        return Err(ConfigError::InvalidParameter {
            param: "width".to_string(),
            value: width.to_string(),
            constraint: "must be greater than 0".to_string(),
        });
    }
    if width > MAX_DIM {
        return Err(ConfigError::InvalidParameter {
            param: "width".to_string(),
            value: width.to_string(),
            constraint: format!("must not exceed {}", MAX_DIM),
        });
    }
    if depth == 0 {
        return Err(ConfigError::InvalidParameter {
            param: "depth".to_string(),
            value: depth.to_string(),
            constraint: "must be greater than 0".to_string(),
        });
    }
    if depth > 64 {
        return Err(ConfigError::InvalidParameter {
            param: "depth".to_string(),
            value: depth.to_string(),
            constraint: "must not exceed 64".to_string(),
        });
    }
    Ok(())
}

/// Validate the collision-decay base, inclusive of both endpoints
pub fn validate_decay(decay: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&decay) || decay.is_nan() {
        return Err(ConfigError::InvalidParameter {
            param: "decay".to_string(),
            value: decay.to_string(),
            constraint: "must be in range [0.0, 1.0]".to_string(),
        });
    }
    Ok(())
}

/// Validate the decay lookup-table size
pub fn validate_decay_lut_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(ConfigError::InvalidParameter {
            param: "decay_lut_size".to_string(),
            value: size.to_string(),
            constraint: "must be >= 1".to_string(),
        });
    }
    Ok(())
}

/// Validate the window/tick pair: both positive, window a multiple of tick
pub fn validate_window_tick(window: Duration, tick: Duration) -> Result<()> {
    if tick.is_zero() {
        return Err(ConfigError::InvalidParameter {
            param: "tick".to_string(),
            value: format!("{:?}", tick),
            constraint: "must be greater than 0".to_string(),
        });
    }
    if window.is_zero() {
        return Err(ConfigError::InvalidParameter {
            param: "window".to_string(),
            value: format!("{:?}", window),
            constraint: "must be greater than 0".to_string(),
        });
    }
    if window.as_nanos() % tick.as_nanos() != 0 {
        return Err(ConfigError::InvalidParameter {
            param: "window".to_string(),
            value: format!("{:?}", window),
            constraint: format!("must be a multiple of tick ({:?})", tick),
        });
    }
    Ok(())
}

/// Validate the metrics sample-window length
pub fn validate_stats_window(len: usize) -> Result<()> {
    if len < MIN_STATS_WINDOW {
        return Err(ConfigError::InvalidParameter {
            param: "stats_window".to_string(),
            value: len.to_string(),
            constraint: format!("must be at least {}", MIN_STATS_WINDOW),
        });
    }
    Ok(())
}
