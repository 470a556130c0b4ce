use std::time::Duration;

use chrono::{DateTime, Local, Utc};

/// Monotonic instant used for every duration in the crate.
/// Tokio's clock so paused-time tests stay deterministic.
pub type AppInstant = tokio::time::Instant;

pub const CLOCK_FORMAT: &str = "%H:%M:%S";

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

pub fn now_local() -> DateTime<Local> {
    Local::now()
}

/// Wall-clock label shown next to log entries, e.g. `14:03:27`.
pub fn clock_label(time: &DateTime<Local>) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// Whole seconds, rounded half-up (a 2.5s scan reads as "3초").
pub fn round_secs(elapsed: Duration) -> u64 {
    (elapsed.as_millis() as u64 + 500) / 1000
}

/// Seconds elapsed since `past`, clamped at zero for clock skew.
pub fn seconds_since(past: DateTime<Utc>) -> i64 {
    (now_utc() - past).num_seconds().max(0)
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    format!("{}d", hours / 24)
}
