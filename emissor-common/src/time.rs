//! Timestamp utilities
//!
//! Scenario and signal rulers carry epoch milliseconds.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Format epoch milliseconds as the local `YYYY-MM-DD-HH-MM-SS` stamp used in
/// brain log file names.
///
/// Returns `None` for values outside the representable range.
pub fn log_stamp(millis: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d-%H-%M-%S").to_string())
}
