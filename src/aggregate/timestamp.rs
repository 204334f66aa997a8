//! Timestamp parsing for retrieved chunks.

use chrono::{NaiveDateTime, NaiveTime};

/// Format every source timestamp is expected to follow.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used to display a moment.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// Substituted when a timestamp is missing or malformed.
pub const SENTINEL_TIME: NaiveTime = NaiveTime::MIN;

/// Parse a source timestamp into its time of day.
///
/// Total: anything that does not match [`TIMESTAMP_FORMAT`] yields [`SENTINEL_TIME`].
pub fn parse_timestamp(raw: &str) -> NaiveTime {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|dt| dt.time())
        .unwrap_or(SENTINEL_TIME)
}

/// Render a time of day as `HH:MM:SS`.
pub fn format_time_of_day(time: &NaiveTime) -> String {
    time.format(TIME_OF_DAY_FORMAT).to_string()
}
