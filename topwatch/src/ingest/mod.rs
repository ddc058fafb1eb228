//! Ingest drivers: pull events out of a line-oriented reader
//!
//! The collaborator opens the file or stdin; drivers here consume any
//! `BufRead`, parse lines according to the configured format, honor the
//! pause gate, apply pace and replay sleeps, and feed the pipeline. A
//! driver never holds the sketch-lock across a read or a sleep.

mod access_log;
mod record;

pub use record::{Record, ResolvedTimestamp, TimestampField};

use crate::clock::ReplayPacer;
use crate::common::IngestError;
use crate::config::{Config, InputFormat};
use crate::pipeline::TopkPipeline;
use chrono::{DateTime, Utc};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// One parsed event ready for the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The counted string
    pub item: String,
    /// Occurrences this event represents
    pub count: u32,
    /// Event time, when the input carries one
    pub timestamp: Option<DateTime<Utc>>,
}

impl Event {
    /// Convenience constructor for an untimestamped single occurrence
    pub fn plain(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            count: 1,
            timestamp: None,
        }
    }
}

/// Totals reported when a driver reaches EOF or its line limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Lines pulled from the reader
    pub lines_read: u64,
    /// Events handed to the pipeline
    pub events: u64,
    /// Lines dropped as empty or unparseable
    pub skipped: u64,
}

/// Line-oriented ingest loop over any `BufRead`
pub struct IngestDriver<R> {
    reader: R,
    pipeline: Arc<TopkPipeline>,
    format: InputFormat,
    layout: String,
    pace: Duration,
    max_lines: u64,
    replay: bool,
    pacer: Option<ReplayPacer>,
}

impl<R: BufRead> IngestDriver<R> {
    /// Builds a driver from a validated configuration
    pub fn new(reader: R, pipeline: Arc<TopkPipeline>, config: &Config) -> Self {
        let pacer = config
            .replay
            .then(|| ReplayPacer::new(config.replay_speed, config.replay_max_sleep));
        Self {
            reader,
            pipeline,
            format: config.format,
            layout: config.timestamp_layout.clone(),
            pace: config.pace,
            max_lines: config.max_lines,
            replay: config.replay,
            pacer,
        }
    }

    /// Runs to EOF or the line limit
    ///
    /// # Errors
    ///
    /// `Io` on a reader failure mid-stream; parse and timestamp errors
    /// only in replay mode, where a dropped event would corrupt pacing.
    /// Outside replay, bad lines are skipped with a debug event.
    pub fn run(mut self) -> Result<IngestSummary, IngestError> {
        let mut summary = IngestSummary::default();
        let mut line = String::new();

        loop {
            if self.max_lines > 0 && summary.lines_read >= self.max_lines {
                break;
            }
            line.clear();
            let n = self.reader.read_line(&mut line).map_err(|err| {
                warn!(error = %err, "input stream failed mid-read");
                IngestError::Io(err)
            })?;
            if n == 0 {
                break;
            }
            summary.lines_read += 1;
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                summary.skipped += 1;
                continue;
            }

            self.pipeline.block_while_paused();

            let event = match self.parse_line(trimmed, summary.lines_read) {
                Ok(event) => event,
                Err(err) if self.replay => return Err(err),
                Err(err) => {
                    debug!(line = summary.lines_read, error = %err, "skipping line");
                    summary.skipped += 1;
                    continue;
                }
            };

            if self.replay {
                let et = event
                    .timestamp
                    .ok_or(IngestError::MissingTimestamp {
                        line: summary.lines_read,
                    })?;
                if let Some(pacer) = self.pacer.as_mut() {
                    let sleep = pacer.pause_for(et);
                    if !sleep.is_zero() {
                        thread::sleep(sleep);
                    }
                }
            }
            if !self.pace.is_zero() {
                thread::sleep(self.pace);
            }

            self.pipeline.ingest_event(&event);
            summary.events += 1;
        }

        Ok(summary)
    }

    fn parse_line(&self, line: &str, line_no: u64) -> Result<Event, IngestError> {
        match self.format {
            InputFormat::Text => Ok(Event::plain(line)),
            InputFormat::AccessLog => {
                let (item, raw_ts) =
                    access_log::split_line(line).ok_or_else(|| IngestError::Parse {
                        line: line_no,
                        reason: "expected '<item> - - [<timestamp>]'".to_string(),
                    })?;
                let timestamp = access_log::parse_timestamp(raw_ts, &self.layout).ok_or_else(
                    || IngestError::InvalidTimestamp {
                        line: line_no,
                        value: raw_ts.to_string(),
                    },
                )?;
                Ok(Event {
                    item: item.to_string(),
                    count: 1,
                    timestamp: Some(timestamp),
                })
            }
            InputFormat::Records => {
                let record = Record::parse(line).map_err(|err| IngestError::Parse {
                    line: line_no,
                    reason: err.to_string(),
                })?;
                if record.count == 0 {
                    return Err(IngestError::Parse {
                        line: line_no,
                        reason: "count must be >= 1".to_string(),
                    });
                }
                let timestamp = match record.resolve_timestamp(&self.layout) {
                    ResolvedTimestamp::At(t) => Some(t),
                    ResolvedTimestamp::Absent => None,
                    ResolvedTimestamp::Invalid => {
                        return Err(IngestError::InvalidTimestamp {
                            line: line_no,
                            value: format!("{:?}", record.timestamp),
                        })
                    }
                };
                Ok(Event {
                    item: record.item,
                    count: record.count,
                    timestamp,
                })
            }
        }
    }
}
