//! Error types for the sync layer.
//!
//! Nothing here is fatal: every variant ends up either in a log entry, a
//! `PollResult::error` or an inline control message.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Connection refused, DNS failure, reset mid-body, ...
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response the server did not attribute to the request itself.
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// 4xx with a server-provided reason (bad config, unknown model key).
    #[error("rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("channel error: {0}")]
    Channel(String),
}

impl SyncError {
    /// Whether the server refused the submitted payload, as opposed to the
    /// call failing in transit.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SyncError::Rejected { .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest doesn't report the configured limit
            return SyncError::Transport(format!("request timed out: {err}"));
        }
        SyncError::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SyncError::Channel(err.to_string())
    }
}
