use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Buy-side strategies the server knows how to run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyId {
    MaxProfit,
    MomentumBreakout,
    VolatilityBreakout,
    RsiReversal,
    LarrySmashDay,
    VolumeSurge,
    LarryWilliamsR,
    BollingerBounce,
    LarryCombo,
}

/// Operator switches that lift a server-side limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlimitedFlags {
    /// No per-trade amount limit: the server invests whatever cash is free.
    pub trade: bool,
    /// Accept every signal regardless of confidence.
    pub signal: bool,
    /// No cap on how much cash may sit in positions.
    pub budget: bool,
}

/// Automation settings. Only operator actions mutate this; the scan cycles
/// read it each time they build a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
    pub strategies: BTreeSet<StrategyId>,
    /// KRW per trade.
    pub trade_amount: f64,
    pub max_positions: u32,
    pub signal_strength_floor: u32,
    pub unlimited: UnlimitedFlags,
}

impl AutomationConfig {
    pub const BUY_MIN_CONFIDENCE: u32 = 70;
    pub const SELL_MIN_CONFIDENCE: u32 = 60;

    pub fn toggle_strategy(&mut self, id: StrategyId) {
        if !self.strategies.remove(&id) {
            self.strategies.insert(id);
        }
    }

    pub fn buy_scan_params(&self, top_n: u32) -> BuyScanParams {
        BuyScanParams {
            // 0 tells the server to use all available cash
            amount: if self.unlimited.trade { 0.0 } else { self.trade_amount },
            top_n,
            no_trade_limit: self.unlimited.trade,
            no_signal_limit: self.unlimited.signal,
            no_budget_limit: self.unlimited.budget,
            min_confidence: if self.unlimited.signal {
                0
            } else {
                Self::BUY_MIN_CONFIDENCE
            },
        }
    }

    pub fn sell_scan_params(&self) -> SellScanParams {
        SellScanParams {
            min_confidence: Self::SELL_MIN_CONFIDENCE,
            auto_execute: true,
        }
    }

    pub fn configure_request(&self) -> ConfigureRequest {
        ConfigureRequest {
            strategies: self.strategies.iter().copied().collect(),
            trade_amount: self.trade_amount,
            max_positions: self.max_positions,
        }
    }

    /// Signal threshold as shown to the operator: `80+`, or `ALL` when lifted.
    pub fn signal_floor_label(&self) -> String {
        if self.unlimited.signal {
            "ALL".to_string()
        } else {
            format!("{}+", self.signal_strength_floor)
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            strategies: BTreeSet::from([
                StrategyId::MaxProfit,
                StrategyId::MomentumBreakout,
                StrategyId::RsiReversal,
            ]),
            trade_amount: 10_000.0,
            max_positions: 3,
            signal_strength_floor: 80,
            unlimited: UnlimitedFlags::default(),
        }
    }
}

/// Query parameters of the buy-side scan-and-act call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyScanParams {
    pub amount: f64,
    pub top_n: u32,
    pub no_trade_limit: bool,
    pub no_signal_limit: bool,
    pub no_budget_limit: bool,
    pub min_confidence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellScanParams {
    pub min_confidence: u32,
    pub auto_execute: bool,
}

/// JSON body of the configure call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigureRequest {
    pub strategies: Vec<StrategyId>,
    pub trade_amount: f64,
    pub max_positions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn signal_floor_label_follows_the_flag() {
        let mut cfg = AutomationConfig::default();
        assert_eq!(cfg.signal_floor_label(), "80+");
        cfg.unlimited.signal = true;
        assert_eq!(cfg.signal_floor_label(), "ALL");
    }

    #[test]
    fn unlimited_flags_zero_out_amount_and_confidence() {
        let mut cfg = AutomationConfig::default();
        let limited = cfg.buy_scan_params(200);
        assert_eq!(limited.amount, 10_000.0);
        assert_eq!(limited.min_confidence, 70);

        cfg.unlimited = UnlimitedFlags {
            trade: true,
            signal: true,
            budget: false,
        };
        let open = cfg.buy_scan_params(200);
        assert_eq!(open.amount, 0.0);
        assert_eq!(open.min_confidence, 0);
        assert!(open.no_trade_limit && open.no_signal_limit && !open.no_budget_limit);
    }

    #[test]
    fn toggling_twice_restores_the_set() {
        let mut cfg = AutomationConfig::default();
        let before = cfg.strategies.clone();
        cfg.toggle_strategy(StrategyId::VolumeSurge);
        assert!(cfg.strategies.contains(&StrategyId::VolumeSurge));
        cfg.toggle_strategy(StrategyId::VolumeSurge);
        assert_eq!(cfg.strategies, before);
    }

    #[test]
    fn strategy_ids_use_server_spelling() {
        assert_eq!(StrategyId::LarryWilliamsR.to_string(), "larry_williams_r");
        assert_eq!(
            StrategyId::from_str("momentum_breakout").unwrap(),
            StrategyId::MomentumBreakout
        );
        let body = serde_json::to_value(AutomationConfig::default().configure_request()).unwrap();
        assert_eq!(body["strategies"][0], "max_profit");
        assert_eq!(body["max_positions"], 3);
    }
}
