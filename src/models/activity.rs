use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

use crate::utils::{clock_label, now_local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogStatus {
    Running,
    Success,
    Info,
    Error,
}

/// One line of the buy/sell activity feed. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub time: DateTime<Local>,
    pub status: LogStatus,
    pub message: String,
    pub details: Option<String>,
}

impl LogEntry {
    pub fn new(status: LogStatus, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: now_local(),
            status,
            message: message.into(),
            details,
        }
    }

    pub fn clock(&self) -> String {
        clock_label(&self.time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThoughtKind {
    Scanning,
    Analysis,
    Info,
    Error,
}

/// One line of an AI-thought stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    pub id: Uuid,
    pub time: DateTime<Local>,
    pub kind: ThoughtKind,
    pub text: String,
}

impl Thought {
    pub fn new(kind: ThoughtKind, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: now_local(),
            kind,
            text: text.into(),
        }
    }
}
