/// Ring capacities for the activity feeds.
pub struct LogCapacities {
    pub scan_log: usize,
    pub signals: usize,
    pub thoughts: usize,
    /// At most this many quick-analysis signals become thoughts per round.
    pub thought_batch: usize,
}

pub const LOGS: LogCapacities = LogCapacities {
    scan_log: 10,
    signals: 10,
    thoughts: 5,
    thought_batch: 3,
};
