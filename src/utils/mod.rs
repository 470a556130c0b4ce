mod perf;
mod time_utils;

pub use time_utils::{
    AppInstant, clock_label, format_duration, now_local, now_utc, round_secs, seconds_since,
};
