//! Access-log line parsing
//!
//! Lines look like `«item» - - [«timestamp»] ...`: the item is the token
//! before the ` - - [` separator and the timestamp is the token before
//! the first `]`, parsed with the configured chrono layout.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Separator between the item and the bracketed timestamp
const FIELD_SEP: &str = " - - [";

/// Splits an access-log line into `(item, raw_timestamp)`
///
/// Returns `None` when the line does not have the expected shape.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let sep = line.find(FIELD_SEP)?;
    let item = &line[..sep];
    let rest = &line[sep + FIELD_SEP.len()..];
    let close = rest.find(']')?;
    if item.is_empty() {
        return None;
    }
    Some((item, &rest[..close]))
}

/// Parses a timestamp token with the given chrono layout
///
/// Tries an offset-aware parse first, then falls back to a naive parse
/// interpreted as UTC for layouts without a zone.
pub fn parse_timestamp(raw: &str, layout: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_str(raw, layout) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, layout)
        .ok()
        .map(|t| t.and_utc())
}
