use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::market::CASH_CURRENCY;

/// Which half of the automated loop a scan cycle drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanSide {
    Buy,
    Sell,
}

impl ScanSide {
    /// Verb used in operator-facing log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            ScanSide::Buy => "매수",
            ScanSide::Sell => "매도",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoughtItem {
    pub ticker: String,
    /// How many of the three AI experts agreed.
    pub votes: u32,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub ticker: String,
    pub score: Option<f64>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyScanResponse {
    pub bought: Vec<BoughtItem>,
    pub top_picks: Option<Vec<Candidate>>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoldItem {
    pub currency: String,
    pub profit_rate: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SellScanResponse {
    pub sold: Vec<SoldItem>,
    pub kept: Option<Vec<serde_json::Value>>,
    pub message: Option<String>,
}

/// Full remote result of one scan-and-act call, kept for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "snake_case")]
pub enum ScanResponse {
    Buy(BuyScanResponse),
    Sell(SellScanResponse),
}

impl ScanResponse {
    pub fn executed_count(&self) -> usize {
        match self {
            ScanResponse::Buy(r) => r.bought.len(),
            ScanResponse::Sell(r) => r.sold.len(),
        }
    }

    /// `BTC (3/3 동의), ETH (2/3 동의)` or `XRP (+4.2%), SOL (-1.0%)`.
    pub fn executed_summary(&self) -> String {
        match self {
            ScanResponse::Buy(r) => r
                .bought
                .iter()
                .map(|b| format!("{} ({}/3 동의)", strip_market(&b.ticker), b.votes))
                .collect::<Vec<_>>()
                .join(", "),
            ScanResponse::Sell(r) => r
                .sold
                .iter()
                .map(|s| format!("{} ({:+.1}%)", s.currency, s.profit_rate))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// What the server considered when it decided not to act.
    pub fn advisory(&self) -> Option<String> {
        match self {
            ScanResponse::Buy(r) => r.top_picks.as_ref().map(|picks| {
                let names: Vec<&str> = picks.iter().take(3).map(|p| strip_market(&p.ticker)).collect();
                format!("관심종목: {}", names.join(", "))
            }),
            ScanResponse::Sell(r) => r.kept.as_ref().map(|kept| format!("보유 유지: {}개", kept.len())),
        }
    }
}

/// How the last run of a cycle ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Executed { response: ScanResponse },
    NoAction { response: ScanResponse },
    Failed { message: String },
}

/// `KRW-BTC` → `BTC`.
pub fn strip_market(ticker: &str) -> &str {
    ticker
        .strip_prefix(CASH_CURRENCY)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(ticker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn buy_summary_and_advisory() {
        let response: BuyScanResponse = serde_json::from_value(json!({
            "success": true,
            "bought": [{"ticker": "KRW-BTC", "votes": 3}, {"ticker": "KRW-ETH", "votes": 2}],
            "top_picks": [
                {"ticker": "KRW-SOL"}, {"ticker": "KRW-XRP"}, {"ticker": "KRW-ADA"}, {"ticker": "KRW-DOT"}
            ]
        }))
        .unwrap();
        let response = ScanResponse::Buy(response);
        assert_eq!(response.executed_count(), 2);
        assert_eq!(response.executed_summary(), "BTC (3/3 동의), ETH (2/3 동의)");
        assert_eq!(response.advisory().as_deref(), Some("관심종목: SOL, XRP, ADA"));
    }

    #[test]
    fn sell_summary_signs_profit() {
        let response = ScanResponse::Sell(SellScanResponse {
            sold: vec![
                SoldItem { currency: "XRP".into(), profit_rate: 4.24, value: 10_000.0 },
                SoldItem { currency: "SOL".into(), profit_rate: -1.0, value: 5_000.0 },
            ],
            kept: None,
            message: None,
        });
        assert_eq!(response.executed_summary(), "XRP (+4.2%), SOL (-1.0%)");
        assert_eq!(response.advisory(), None);
    }

    #[test]
    fn strip_market_leaves_bare_symbols_alone() {
        assert_eq!(strip_market("KRW-BTC"), "BTC");
        assert_eq!(strip_market("BTC"), "BTC");
        assert_eq!(strip_market("KRWX"), "KRWX");
    }
}
