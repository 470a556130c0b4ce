//! Scripted in-memory `DashboardApi` for tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{BuyScanParams, ConfigureRequest, SellScanParams};
use crate::data::{ControlAck, DashboardApi};
use crate::error::{Result, SyncError};
use crate::models::{
    AutomationStatus, BalanceSheet, BuyScanResponse, DebateHistory, DebateResult, MarketPrices,
    PositionsSnapshot, QuickAnalysisResponse, ScanSide, SellScanResponse, TopPicks, TradeFeed,
};
use crate::shared::Shared;

/// What a scripted endpoint answers.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Transport(String),
    Reject(String),
}

impl<T: Default> Default for Reply<T> {
    fn default() -> Self {
        Reply::Ok(T::default())
    }
}

impl<T: Clone> Reply<T> {
    fn produce(&self) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Transport(msg) => Err(SyncError::Transport(msg.clone())),
            Reply::Reject(detail) => Err(SyncError::Rejected {
                status: 400,
                detail: detail.clone(),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub balances: Shared<Reply<BalanceSheet>>,
    pub trades: Shared<Reply<TradeFeed>>,
    pub status: Shared<Reply<AutomationStatus>>,
    pub prices: Shared<Reply<MarketPrices>>,
    pub positions: Shared<Reply<PositionsSnapshot>>,
    pub history: Shared<Reply<DebateHistory>>,
    pub top_picks: Shared<Reply<TopPicks>>,
    pub control: Shared<Reply<ControlAck>>,
    pub buy_scan: Shared<Reply<BuyScanResponse>>,
    pub sell_scan: Shared<Reply<SellScanResponse>>,
    pub debate: Shared<Reply<DebateResult>>,
    pub quick_buy: Shared<Reply<QuickAnalysisResponse>>,
    pub quick_sell: Shared<Reply<QuickAnalysisResponse>>,

    delays: Shared<HashMap<&'static str, Duration>>,
    calls: Shared<Vec<String>>,
    last_buy_params: Shared<Option<BuyScanParams>>,
    last_configure: Shared<Option<ConfigureRequest>>,
}

impl FakeApi {
    pub fn set<T>(slot: &Shared<Reply<T>>, reply: Reply<T>) {
        slot.write(|r| *r = reply);
    }

    /// Every call to `endpoint` sleeps this long before answering.
    pub fn delay(&self, endpoint: &'static str, delay: Duration) {
        self.delays.write(|d| d.insert(endpoint, delay));
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls
            .read(|calls| calls.iter().filter(|c| c.as_str() == endpoint).count())
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.snapshot()
    }

    pub fn last_buy_params(&self) -> Option<BuyScanParams> {
        self.last_buy_params.snapshot()
    }

    pub fn last_configure(&self) -> Option<ConfigureRequest> {
        self.last_configure.snapshot()
    }

    async fn answer<T: Clone>(&self, endpoint: &'static str, slot: &Shared<Reply<T>>) -> Result<T> {
        self.calls.write(|calls| calls.push(endpoint.to_string()));
        if let Some(delay) = self.delays.read(|d| d.get(endpoint).copied()) {
            tokio::time::sleep(delay).await;
        }
        slot.read(Reply::produce)
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn fetch_balances(&self) -> Result<BalanceSheet> {
        self.answer("fetch_balances", &self.balances).await
    }

    async fn fetch_trades(&self) -> Result<TradeFeed> {
        self.answer("fetch_trades", &self.trades).await
    }

    async fn fetch_status(&self) -> Result<AutomationStatus> {
        self.answer("fetch_status", &self.status).await
    }

    async fn fetch_prices(&self) -> Result<MarketPrices> {
        self.answer("fetch_prices", &self.prices).await
    }

    async fn fetch_positions(&self) -> Result<PositionsSnapshot> {
        self.answer("fetch_positions", &self.positions).await
    }

    async fn fetch_debate_history(&self) -> Result<DebateHistory> {
        self.answer("fetch_debate_history", &self.history).await
    }

    async fn fetch_top_picks(&self) -> Result<TopPicks> {
        self.answer("fetch_top_picks", &self.top_picks).await
    }

    async fn configure(&self, request: &ConfigureRequest) -> Result<ControlAck> {
        self.last_configure.write(|c| *c = Some(request.clone()));
        self.answer("configure", &self.control).await
    }

    async fn start_automation(&self) -> Result<ControlAck> {
        self.answer("start_automation", &self.control).await
    }

    async fn stop_automation(&self) -> Result<ControlAck> {
        self.answer("stop_automation", &self.control).await
    }

    async fn change_model(&self, _model_key: &str) -> Result<ControlAck> {
        self.answer("change_model", &self.control).await
    }

    async fn scan_and_buy(&self, params: &BuyScanParams) -> Result<BuyScanResponse> {
        self.last_buy_params.write(|p| *p = Some(params.clone()));
        self.answer("scan_and_buy", &self.buy_scan).await
    }

    async fn scan_and_sell(&self, _params: &SellScanParams) -> Result<SellScanResponse> {
        self.answer("scan_and_sell", &self.sell_scan).await
    }

    async fn run_debate(&self, _ticker: &str) -> Result<DebateResult> {
        self.answer("run_debate", &self.debate).await
    }

    async fn quick_analysis(&self, side: ScanSide) -> Result<QuickAnalysisResponse> {
        match side {
            ScanSide::Buy => self.answer("quick_analysis_buy", &self.quick_buy).await,
            ScanSide::Sell => self.answer("quick_analysis_sell", &self.quick_sell).await,
        }
    }
}
