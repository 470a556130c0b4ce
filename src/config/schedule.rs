use std::time::Duration;

/// Every timer period in the sync layer.
pub struct ScheduleConfig {
    /// Period shared by the five poll loops.
    pub poll_interval: Duration,
    /// Fixed delay before re-opening a lost channel. No back-off, no cap.
    pub reconnect_delay: Duration,
    /// Auto-repeat period for the buy and sell scan cycles.
    pub auto_scan_period: Duration,
    pub elapsed_tick: Duration,
    pub reveal_interval: Duration,
    pub thought_period: Duration,
    /// Deadline covering both quick-analysis calls of one thought round.
    pub thought_timeout: Duration,
}

pub const SCHEDULE: ScheduleConfig = ScheduleConfig {
    poll_interval: Duration::from_secs(5),
    reconnect_delay: Duration::from_secs(3),
    auto_scan_period: Duration::from_secs(60),
    elapsed_tick: Duration::from_secs(1),
    reveal_interval: Duration::from_millis(1500),
    thought_period: Duration::from_secs(30),
    thought_timeout: Duration::from_secs(25),
};
