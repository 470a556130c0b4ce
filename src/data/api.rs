use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{BuyScanParams, ConfigureRequest, SellScanParams};
use crate::error::{Result, SyncError};
use crate::models::{
    AutomationStatus, BalanceSheet, BuyScanResponse, DebateHistory, DebateResult, MarketPrices,
    PositionsSnapshot, QuickAnalysisResponse, ScanSide, SellScanResponse, TopPicks, TradeFeed,
};

/// Abstract interface to the trading server's request/response side.
///
/// Reads are idempotent; everything that changes server state takes `&self`
/// too, since the server is the one serializing those.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_balances(&self) -> Result<BalanceSheet>;
    async fn fetch_trades(&self) -> Result<TradeFeed>;
    async fn fetch_status(&self) -> Result<AutomationStatus>;
    async fn fetch_prices(&self) -> Result<MarketPrices>;
    async fn fetch_positions(&self) -> Result<PositionsSnapshot>;
    async fn fetch_debate_history(&self) -> Result<DebateHistory>;
    async fn fetch_top_picks(&self) -> Result<TopPicks>;

    async fn configure(&self, request: &ConfigureRequest) -> Result<ControlAck>;
    async fn start_automation(&self) -> Result<ControlAck>;
    async fn stop_automation(&self) -> Result<ControlAck>;
    async fn change_model(&self, model_key: &str) -> Result<ControlAck>;

    async fn scan_and_buy(&self, params: &BuyScanParams) -> Result<BuyScanResponse>;
    async fn scan_and_sell(&self, params: &SellScanParams) -> Result<SellScanResponse>;

    async fn run_debate(&self, ticker: &str) -> Result<DebateResult>;
    async fn quick_analysis(&self, side: ScanSide) -> Result<QuickAnalysisResponse>;
}

/// Reply of a control call. The server is loose about which of these it
/// fills in; an explicit `success: false` is the only hard signal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlAck {
    pub success: Option<bool>,
    pub status: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ControlAck {
    /// Turn an in-band refusal into `SyncError::Rejected`.
    pub fn into_result(self) -> Result<Self> {
        if self.success == Some(false) {
            let detail = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "request refused".to_string());
            return Err(SyncError::Rejected {
                status: 200,
                detail,
            });
        }
        Ok(self)
    }
}
