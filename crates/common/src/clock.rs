use chrono::{Local, TimeZone, Utc};

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn days_to_millis(days: u32) -> i64 {
    i64::from(days) * MILLIS_PER_DAY
}

/// Render epoch milliseconds as `dd.MM.yyyy HH:mm:ss` in the local zone.
///
/// Out-of-range values fall back to the raw number.
pub fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(at) => at.format("%d.%m.%Y %H:%M:%S").to_string(),
        None => format!("{millis}ms"),
    }
}
