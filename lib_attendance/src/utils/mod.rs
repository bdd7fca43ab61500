//! # Utilities Module
//!
//! Small helpers shared by the loggers and the clinic clients.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use chrono::{DateTime, NaiveDate, Utc};

/// Current UTC time formatted as an RFC 9557 / RFC 3339 timestamp with millis.
pub fn current_datetime_rfc9557() -> String {
    format_rfc9557(Utc::now())
}

/// Formats `ts` the way log records carry it, e.g. `2024-03-01T09:15:00.250Z`.
pub fn format_rfc9557(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// ISO-8601 calendar date, e.g. `2024-02-29`.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
