use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::InboxError;

/// Parse a stored instant. Accepts RFC 3339 as written by [`format_timestamp`]
/// and SQLite's `datetime('now')` form, which carries no zone and is UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, InboxError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|_| InboxError::MalformedTimestamp {
            raw: raw.to_string(),
        })
}

/// Fixed-width UTC form, so stored values also sort correctly as text.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
