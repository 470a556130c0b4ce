use serde::{Deserialize, Serialize};

/// One expert's turn in a debate. Never mutated after arrival.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateMessage {
    pub id: String,
    pub expert_id: String,
    pub expert_name: String,
    /// `strong_buy`, `buy`, `hold`, `sell` or `strong_sell`.
    pub opinion: String,
    #[serde(deserialize_with = "super::lenient::confidence")]
    pub confidence: u32,
    #[serde(deserialize_with = "super::lenient::null_as_default")]
    pub content: String,
    pub key_points: Vec<String>,
    pub timestamp: String,
}

/// A finished debate. The server returns it in one response; the reveal
/// sequencer replays `messages` to make it read like a live discussion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateResult {
    pub ticker: String,
    pub coin_name: String,
    pub messages: Vec<DebateMessage>,
    pub consensus: String,
    #[serde(deserialize_with = "super::lenient::confidence")]
    pub consensus_confidence: u32,
    pub final_verdict: String,
    pub price_target: Option<f64>,
    pub key_reasons: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateHistory {
    pub count: usize,
    pub debates: Vec<DebateResult>,
}

/// Consensus buy recommendation distilled from past debates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopPick {
    pub ticker: String,
    pub coin: String,
    pub verdict: String,
    #[serde(deserialize_with = "super::lenient::confidence")]
    pub confidence: u32,
    pub reasons: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopPicks {
    pub count: usize,
    pub picks: Vec<TopPick>,
}

/// Body of `quick-analysis`: a handful of signal sentences or a summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickAnalysis {
    pub signals: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickAnalysisResponse {
    pub analysis: Option<QuickAnalysis>,
}
