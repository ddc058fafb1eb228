//! topwatch: live Top-K observer for high-throughput event streams
//!
//! Ingests unbounded string events, maintains an approximate
//! sliding-window frequency estimate in bounded memory, and
//! continuously surfaces the K most frequent items with their per-tick
//! trajectories. The terminal UI, flag parsing and stream opening are
//! collaborators; this crate is the ingest-and-rank pipeline.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod common;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod rank;
pub mod sketch;
pub mod window;

// Re-export the core surface for convenience
pub use clock::{ClockMode, ReplayPacer, TickClock};
pub use common::{ConfigError, IngestError, RollingRing};
pub use config::{Config, InputFormat, DEFAULT_TIMESTAMP_LAYOUT};
pub use ingest::{Event, IngestDriver, IngestSummary, Record, ResolvedTimestamp, TimestampField};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::TopkPipeline;
pub use rank::Ranker;
pub use sketch::{TopItem, TopkSketch};
pub use window::SlidingTopk;

/// Error types and result aliases for pipeline construction
pub mod error {
    pub use crate::common::{ConfigError, IngestError, Result};
}
