//! Record-stream events: one JSON document per line
//!
//! `{ "item": string, "count": integer >= 1 (default 1), "timestamp":
//! integer epoch | float epoch | layout string | absent }`. The
//! timestamp is a tagged union; resolution yields an instant, "absent",
//! or "invalid".

use super::access_log::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Raw timestamp value as it appears in a record
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TimestampField {
    /// Whole epoch seconds
    Epoch(i64),
    /// Fractional epoch seconds
    EpochFloat(f64),
    /// A string in the configured layout
    Layout(String),
}

/// Outcome of resolving a record's timestamp field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTimestamp {
    /// The record carried no timestamp
    Absent,
    /// The record's timestamp resolved to this instant
    At(DateTime<Utc>),
    /// A timestamp was present but could not be resolved
    Invalid,
}

impl TimestampField {
    /// Resolves the field against the configured layout
    pub fn resolve(&self, layout: &str) -> ResolvedTimestamp {
        match self {
            TimestampField::Epoch(secs) => match DateTime::from_timestamp(*secs, 0) {
                Some(t) => ResolvedTimestamp::At(t),
                None => ResolvedTimestamp::Invalid,
            },
            TimestampField::EpochFloat(secs) => {
                if !secs.is_finite() {
                    return ResolvedTimestamp::Invalid;
                }
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round() as u32;
                match DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)) {
                    Some(t) => ResolvedTimestamp::At(t),
                    None => ResolvedTimestamp::Invalid,
                }
            }
            TimestampField::Layout(raw) => match parse_timestamp(raw, layout) {
                Some(t) => ResolvedTimestamp::At(t),
                None => ResolvedTimestamp::Invalid,
            },
        }
    }
}

fn default_count() -> u32 {
    1
}

/// One record-stream document
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    /// The event string
    pub item: String,
    /// Occurrences this record represents (>= 1)
    #[serde(default = "default_count")]
    pub count: u32,
    /// Optional event time
    #[serde(default)]
    pub timestamp: Option<TimestampField>,
}

impl Record {
    /// Parses one JSON document
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Resolves the timestamp field, treating a missing field as absent
    pub fn resolve_timestamp(&self, layout: &str) -> ResolvedTimestamp {
        match &self.timestamp {
            None => ResolvedTimestamp::Absent,
            Some(field) => field.resolve(layout),
        }
    }
}
