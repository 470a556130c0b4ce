use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{now_utc, seconds_since};

/// Latest value merged by one poll loop. No history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResult<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
    /// Set by a failed tick; `data` and `fetched_at` keep the last good value.
    pub error: Option<String>,
}

impl<T> PollResult<T> {
    pub fn fresh(data: T) -> Self {
        Self {
            data,
            fetched_at: now_utc(),
            error: None,
        }
    }

    pub fn age_secs(&self) -> i64 {
        seconds_since(self.fetched_at)
    }
}

/// Record a failed tick on an optional slot without touching its data.
pub fn mark_failed<T>(slot: &mut Option<PollResult<T>>, error: String) {
    if let Some(result) = slot.as_mut() {
        result.error = Some(error);
    }
}
