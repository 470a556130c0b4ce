//! Wire shapes of the read endpoints and the push channel payloads.
//!
//! Every struct is `#[serde(default)]`: the server grows fields freely and
//! drops optional ones when a lookup fails, and a partial row beats a
//! rejected poll.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const CASH_CURRENCY: &str = "KRW";

/// One wallet line as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub currency: String,
    pub balance: f64,
    pub locked: f64,
    pub avg_buy_price: f64,
    pub current_price: f64,
    /// Valuation in KRW at `current_price`.
    pub eval_amount: f64,
    pub profit: f64,
    pub profit_rate: f64,
    pub buy_date: Option<String>,
    pub days_held: Option<i64>,
}

impl Balance {
    pub fn is_cash(&self) -> bool {
        self.currency == CASH_CURRENCY
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSheet {
    pub balances: Vec<Balance>,
    pub total_krw: f64,
    pub auth_status: Option<String>,
    /// The balance endpoint reports exchange failures in-band.
    pub error: Option<String>,
}

impl BalanceSheet {
    /// Sheet built from a bare balance list (the channel's `balances` push).
    pub fn from_balances(balances: Vec<Balance>) -> Self {
        let total_krw = balances.iter().map(|b| b.eval_amount).sum();
        Self {
            balances,
            total_krw,
            auth_status: None,
            error: None,
        }
    }

    pub fn cash(&self) -> f64 {
        self.balances
            .iter()
            .find(|b| b.is_cash())
            .map(|b| b.balance)
            .unwrap_or(0.0)
    }

    /// Non-zero, non-cash holdings.
    pub fn held(&self) -> impl Iterator<Item = &Balance> {
        self.balances
            .iter()
            .filter(|b| !b.is_cash() && b.balance > 0.0)
    }
}

/// An executed buy or sell recorded by the server's automation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeRecord {
    pub id: String,
    pub ticker: String,
    pub coin_name: String,
    pub action: String,
    pub strategy: String,
    pub price: f64,
    pub amount: f64,
    pub total_krw: f64,
    #[serde(deserialize_with = "super::lenient::null_as_default")]
    pub ai_reason: String,
    #[serde(deserialize_with = "super::lenient::confidence")]
    pub ai_confidence: u32,
    pub timestamp: String,
    pub profit: Option<f64>,
    pub profit_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeFeed {
    pub logs: Vec<TradeRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationStatus {
    pub is_running: bool,
    pub strategies: Vec<String>,
    pub trade_amount: f64,
    pub max_positions: u32,
    pub current_positions: u32,
    pub scanned_coins: u32,
    pub ai_model: Option<String>,
    pub available_models: Option<serde_json::Value>,
}

/// Ticker quote from `/api/prices`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Quote {
    pub trade_price: f64,
    pub signed_change_rate: f64,
}

impl Quote {
    pub fn change_pct(&self) -> f64 {
        self.signed_change_rate * 100.0
    }
}

/// Market index prices keyed by ticker (`KRW-BTC`, ...).
pub type MarketPrices = HashMap<String, Quote>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub ticker: String,
    pub coin_name: String,
    pub entry_price: f64,
    pub current_price: f64,
    pub profit_rate: f64,
    pub max_profit: f64,
    pub trailing_stop: Option<f64>,
    pub entry_time: Option<String>,
    pub holding_time: Option<String>,
    pub holding_seconds: i64,
    pub invest_amount: f64,
    pub strategy: String,
    pub status: String,
    pub is_ai_managed: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionsSnapshot {
    pub positions: Vec<Position>,
    pub sell_strategy_config: Option<serde_json::Value>,
}

/// A trade signal discovered by the server and pushed over the channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Signal {
    pub ticker: String,
    pub strategy: String,
    #[serde(deserialize_with = "super::lenient::null_as_default")]
    pub strength: f64,
    #[serde(deserialize_with = "super::lenient::null_as_default")]
    pub reason: String,
    pub timestamp: Option<String>,
}
