//! Timestamp parsing and the "new event" window.
//!
//! The detection backend emits timestamps either as RFC 3339 strings or
//! as SQLite-style naive `YYYY-MM-DD HH:MM:SS[.ffffff]` values, which are
//! interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::types::Timestamp;

/// Default window during which a freshly captured event counts as new.
pub const NEW_EVENT_WINDOW_SECS: i64 = 5 * 60;

/// Naive formats accepted in addition to RFC 3339.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a backend timestamp. Returns `None` when no accepted format matches.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Whether an event captured at `timestamp` is still inside the new-event
/// window at `now`. Timestamps in the future (clock skew) count as new.
pub fn is_new_at(timestamp: Timestamp, now: Timestamp, window: chrono::Duration) -> bool {
    now.signed_duration_since(timestamp) <= window
}

/// The default new-event window as a [`chrono::Duration`].
pub fn default_new_event_window() -> chrono::Duration {
    chrono::Duration::seconds(NEW_EVENT_WINDOW_SECS)
}

/// Serde adapter for required backend timestamps.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

/// Serde adapter for optional backend timestamps. `null` and absent both
/// map to `None`; a present but unparseable value is an error.
pub fn deserialize_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}
