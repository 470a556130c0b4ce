//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Log every poll tick, merge and stale drop.
    pub log_poll_ticks: bool,

    /// Emit verbose logging for channel connects, closes and envelopes.
    pub log_channel_events: bool,

    /// Scan cycle entry/exit and skipped (already running) calls.
    pub log_scan_cycle: bool,

    pub log_reveal: bool,
    pub log_thoughts: bool,

    /// Activate trace_time macro (slow remote calls)
    pub log_performance: bool,
}

pub const DF: LogFlags = LogFlags {
    log_poll_ticks: false,
    log_channel_events: true,
    log_scan_cycle: true,
    log_reveal: false,
    log_thoughts: false,
    log_performance: true,
};
