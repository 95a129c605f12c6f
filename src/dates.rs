//! Lenient date parsing for frontmatter timestamps.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse a date string as written by authors or the data layer.
///
/// Accepts RFC 3339 (`2023-04-01T09:30:00+09:00`), a space-separated
/// date-time (`2023-04-01 09:30:00`), and a bare date (`2023-04-01`). The
/// calendar date is taken as written; offsets are not normalised.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Format `raw` with `format`, or return it unchanged when it does not
/// parse or `format` is not a valid strftime pattern.
pub fn format_date(raw: &str, format: &str) -> String {
    let Some(date) = parse_date(raw) else {
        tracing::warn!(date = raw, "unparseable date, rendering verbatim");
        return raw.trim().to_owned();
    };
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::warn!(date = raw, format, "invalid date format, rendering verbatim");
        return raw.trim().to_owned();
    }
    out
}
