use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::config::{AutomationConfig, LOGS};
use crate::data::ChannelState;
use crate::error::SyncError;
use crate::engine::{PollKind, PollStats, RevealState, ScanCycleState, ThoughtFeedState};
use crate::models::{
    AutomationStatus, Balance, BalanceSheet, DebateHistory, LogEntry, MarketPrices, PollResult,
    PositionsSnapshot, RingLog, ScanSide, Signal, Thought, TopPicks, TradeFeed,
};
use crate::utils::{now_local, now_utc};

/// Inline result of an operator control action (start, stop, model change).
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFeedback {
    pub action: String,
    pub message: String,
    /// The server refused the request itself (bad config, unknown model).
    pub rejected: bool,
    pub ok: bool,
    pub time: DateTime<Local>,
}

impl ControlFeedback {
    pub fn accepted(action: &str, message: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            message: message.into(),
            rejected: false,
            ok: true,
            time: now_local(),
        }
    }

    pub fn failed(action: &str, error: &SyncError) -> Self {
        let message = match error {
            SyncError::Rejected { detail, .. } => detail.clone(),
            other => other.to_string(),
        };
        Self {
            action: action.to_string(),
            message,
            rejected: error.is_rejection(),
            ok: false,
            time: now_local(),
        }
    }
}

/// Every slice the dashboard shows, apart from the ones owned by the
/// channel, the scan cycles, the reveal sequencer and the thought feed.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub balances: Option<PollResult<BalanceSheet>>,
    pub trades: Option<PollResult<TradeFeed>>,
    pub status: Option<PollResult<AutomationStatus>>,
    pub prices: Option<PollResult<MarketPrices>>,
    pub positions: Option<PollResult<PositionsSnapshot>>,

    pub debate_history: Option<DebateHistory>,
    pub top_picks: Option<TopPicks>,

    pub buy_log: RingLog<LogEntry>,
    pub sell_log: RingLog<LogEntry>,
    pub signals: RingLog<Signal>,
    pub buy_thoughts: RingLog<Thought>,
    pub sell_thoughts: RingLog<Thought>,

    pub config: AutomationConfig,
    pub selected_model: Option<String>,
    pub feedback: Option<ControlFeedback>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            balances: None,
            trades: None,
            status: None,
            prices: None,
            positions: None,
            debate_history: None,
            top_picks: None,
            buy_log: RingLog::new(LOGS.scan_log),
            sell_log: RingLog::new(LOGS.scan_log),
            signals: RingLog::new(LOGS.signals),
            buy_thoughts: RingLog::new(LOGS.thoughts),
            sell_thoughts: RingLog::new(LOGS.thoughts),
            config: AutomationConfig::default(),
            selected_model: None,
            feedback: None,
        }
    }
}

impl DashboardState {
    pub fn scan_log_mut(&mut self, side: ScanSide) -> &mut RingLog<LogEntry> {
        match side {
            ScanSide::Buy => &mut self.buy_log,
            ScanSide::Sell => &mut self.sell_log,
        }
    }

    pub fn thoughts_mut(&mut self, side: ScanSide) -> &mut RingLog<Thought> {
        match side {
            ScanSide::Buy => &mut self.buy_thoughts,
            ScanSide::Sell => &mut self.sell_thoughts,
        }
    }

    /// Non-zero holdings other than cash.
    pub fn held_coins(&self) -> Vec<&Balance> {
        self.balances
            .as_ref()
            .map(|b| b.data.held().collect())
            .unwrap_or_default()
    }

    pub fn krw_balance(&self) -> f64 {
        self.balances.as_ref().map_or(0.0, |b| b.data.cash())
    }

    pub fn total_value(&self) -> f64 {
        self.balances.as_ref().map_or(0.0, |b| b.data.total_krw)
    }

    pub fn automation_running(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.data.is_running)
    }

    /// Replace the wallet lines with a pushed list, keeping the last known
    /// auth status (the push doesn't carry one).
    pub fn replace_balances(&mut self, lines: Vec<Balance>) {
        let mut sheet = BalanceSheet::from_balances(lines);
        sheet.auth_status = self
            .balances
            .as_ref()
            .and_then(|b| b.data.auth_status.clone());
        self.balances = Some(PollResult::fresh(sheet));
    }

    pub fn set_automation_running(&mut self, running: bool) {
        if let Some(status) = self.status.as_mut() {
            status.data.is_running = running;
        }
    }

    pub fn fetched_at(&self, kind: PollKind) -> Option<DateTime<Utc>> {
        match kind {
            PollKind::Balances => self.balances.as_ref().map(|r| r.fetched_at),
            PollKind::Trades => self.trades.as_ref().map(|r| r.fetched_at),
            PollKind::Status => self.status.as_ref().map(|r| r.fetched_at),
            PollKind::Prices => self.prices.as_ref().map(|r| r.fetched_at),
            PollKind::Positions => self.positions.as_ref().map(|r| r.fetched_at),
        }
    }

    /// Seconds since the last good fetch of `kind`.
    pub fn age_secs(&self, kind: PollKind) -> Option<i64> {
        match kind {
            PollKind::Balances => self.balances.as_ref().map(PollResult::age_secs),
            PollKind::Trades => self.trades.as_ref().map(PollResult::age_secs),
            PollKind::Status => self.status.as_ref().map(PollResult::age_secs),
            PollKind::Prices => self.prices.as_ref().map(PollResult::age_secs),
            PollKind::Positions => self.positions.as_ref().map(PollResult::age_secs),
        }
    }

    pub fn poll_error(&self, kind: PollKind) -> Option<&str> {
        let error = match kind {
            PollKind::Balances => self.balances.as_ref().map(|r| &r.error),
            PollKind::Trades => self.trades.as_ref().map(|r| &r.error),
            PollKind::Status => self.status.as_ref().map(|r| &r.error),
            PollKind::Prices => self.prices.as_ref().map(|r| &r.error),
            PollKind::Positions => self.positions.as_ref().map(|r| &r.error),
        };
        error.and_then(|e| e.as_deref())
    }

    /// Never fetched, or last good fetch older than `max_age`.
    pub fn is_stale(&self, kind: PollKind, max_age: Duration) -> bool {
        match self.fetched_at(kind) {
            None => true,
            // an age limit past chrono's range is never exceeded
            Some(at) => chrono::Duration::from_std(max_age).is_ok_and(|max| now_utc() - at > max),
        }
    }
}

/// Read projection of the whole dashboard at one instant.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub state: DashboardState,
    pub channel: ChannelState,
    pub buy_cycle: ScanCycleState,
    pub sell_cycle: ScanCycleState,
    pub auto_buy: bool,
    pub auto_sell: bool,
    pub reveal: RevealState,
    pub thoughts: ThoughtFeedState,
    pub poll_stats: Vec<(PollKind, PollStats)>,
}
