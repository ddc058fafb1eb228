//! Error types for the ingest-and-rank pipeline

use std::fmt;
use std::io;

/// Errors raised by configuration validation
///
/// Every violated constraint is fatal at startup; the collaborator maps
/// these to a nonzero exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid parameter provided to a constructor or to `Config::validate`
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Invalid value provided
        value: String,
        /// Constraint that was violated
        constraint: String,
    },

    /// Two options that cannot be combined
    IncompatibleOptions {
        /// Explanation of the conflict
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}': value '{}' {}",
                    param, value, constraint
                )
            }
            ConfigError::IncompatibleOptions { reason } => {
                write!(f, "Incompatible options: {}", reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised while driving events from an input stream
///
/// Parse-shaped variants are skippable in live mode and fatal in replay
/// mode, where a dropped event would corrupt pacing.
#[derive(Debug)]
pub enum IngestError {
    /// The underlying reader failed mid-stream
    Io(io::Error),

    /// A line did not match the configured input format
    Parse {
        /// 1-based line number in the stream
        line: u64,
        /// What the parser choked on
        reason: String,
    },

    /// A timestamp field was present but could not be resolved
    InvalidTimestamp {
        /// 1-based line number in the stream
        line: u64,
        /// The raw timestamp token
        value: String,
    },

    /// Replay mode requires every event to carry a timestamp
    MissingTimestamp {
        /// 1-based line number in the stream
        line: u64,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Io(err) => write!(f, "I/O error: {}", err),
            IngestError::Parse { line, reason } => {
                write!(f, "Parse error at line {}: {}", line, reason)
            }
            IngestError::InvalidTimestamp { line, value } => {
                write!(f, "Invalid timestamp at line {}: '{}'", line, value)
            }
            IngestError::MissingTimestamp { line } => {
                write!(f, "Replay requires a timestamp, line {} has none", line)
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        IngestError::Io(err)
    }
}

/// Result type alias for configuration and construction
pub type Result<T> = std::result::Result<T, ConfigError>;
