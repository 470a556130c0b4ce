use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{API, BuyScanParams, ConfigureRequest, SellScanParams};
use crate::error::{Result, SyncError};
use crate::models::{
    AutomationStatus, BalanceSheet, BuyScanResponse, DebateHistory, DebateResult, MarketPrices,
    PositionsSnapshot, QuickAnalysisResponse, ScanSide, SellScanResponse, TopPicks, TradeFeed,
};

use super::api::{ControlAck, DashboardApi};

/// Supplies the bearer credential attached to each request. The credential
/// store itself lives outside this crate.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Anonymous access.
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token handed over at startup.
pub struct StaticToken(pub String);

impl CredentialSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// `DashboardApi` over plain HTTP/JSON.
pub struct HttpApi {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(API.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: Arc::new(NoCredentials),
        })
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.authorize(self.client.get(self.url(path)).query(query));
        decode(request.send().await?).await
    }

    async fn post<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        decode(self.authorize(request).send().await?).await
    }

    async fn control(&self, request: RequestBuilder) -> Result<ControlAck> {
        self.post::<ControlAck>(request).await?.into_result()
    }
}

/// Map a response onto the error taxonomy, then decode the body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let detail = error_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        });
        return Err(if status.is_client_error() && status != StatusCode::NOT_FOUND {
            SyncError::Rejected {
                status: status.as_u16(),
                detail,
            }
        } else {
            SyncError::Status {
                status: status.as_u16(),
                detail,
            }
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

/// FastAPI puts the reason in `{"detail": ...}`.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn bool_param(value: bool) -> String {
    value.to_string()
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_balances(&self) -> Result<BalanceSheet> {
        self.get("/api/balance", &[]).await
    }

    async fn fetch_trades(&self) -> Result<TradeFeed> {
        self.get(
            "/api/ai-scalping/logs",
            &[("limit", API.trades_limit.to_string())],
        )
        .await
    }

    async fn fetch_status(&self) -> Result<AutomationStatus> {
        self.get("/api/ai-scalping/status", &[]).await
    }

    async fn fetch_prices(&self) -> Result<MarketPrices> {
        self.get("/api/prices", &[("tickers", API.index_tickers.join(","))])
            .await
    }

    async fn fetch_positions(&self) -> Result<PositionsSnapshot> {
        self.get("/api/ai-scalping/positions", &[]).await
    }

    async fn fetch_debate_history(&self) -> Result<DebateHistory> {
        self.get(
            "/api/debate/history",
            &[("limit", API.debate_history_limit.to_string())],
        )
        .await
    }

    async fn fetch_top_picks(&self) -> Result<TopPicks> {
        self.get("/api/debate/top-picks", &[("n", API.top_picks.to_string())])
            .await
    }

    async fn configure(&self, request: &ConfigureRequest) -> Result<ControlAck> {
        self.control(
            self.client
                .post(self.url("/api/ai-scalping/configure"))
                .json(request),
        )
        .await
    }

    async fn start_automation(&self) -> Result<ControlAck> {
        self.control(self.client.post(self.url("/api/ai-scalping/start")))
            .await
    }

    async fn stop_automation(&self) -> Result<ControlAck> {
        self.control(self.client.post(self.url("/api/ai-scalping/stop")))
            .await
    }

    async fn change_model(&self, model_key: &str) -> Result<ControlAck> {
        let path = format!("/api/ai-scalping/models/{model_key}");
        self.control(self.client.post(self.url(&path))).await
    }

    async fn scan_and_buy(&self, params: &BuyScanParams) -> Result<BuyScanResponse> {
        let query = ScanQuery::from(params);
        self.post(
            self.client
                .post(self.url("/api/ai-max-profit/ai-scan"))
                .query(&query)
                .timeout(API.scan_timeout),
        )
        .await
    }

    async fn scan_and_sell(&self, params: &SellScanParams) -> Result<SellScanResponse> {
        self.post(
            self.client
                .post(self.url("/api/ai-max-profit/ai-sell"))
                .query(&[
                    ("min_confidence", params.min_confidence.to_string()),
                    ("auto_execute", bool_param(params.auto_execute)),
                ])
                .timeout(API.scan_timeout),
        )
        .await
    }

    async fn run_debate(&self, ticker: &str) -> Result<DebateResult> {
        let path = format!("/api/debate/{ticker}");
        self.post(self.client.post(self.url(&path)).timeout(API.scan_timeout))
            .await
    }

    async fn quick_analysis(&self, side: ScanSide) -> Result<QuickAnalysisResponse> {
        self.post(
            self.client
                .post(self.url("/api/ai-max-profit/quick-analysis"))
                .query(&[
                    ("type", side.to_string()),
                    ("limit", API.quick_analysis_limit.to_string()),
                ]),
        )
        .await
    }
}

/// Buy scan query string. The server wants whole won, not `10000.0`.
#[derive(Serialize)]
struct ScanQuery {
    amount: u64,
    top_n: u32,
    no_trade_limit: bool,
    no_signal_limit: bool,
    no_budget_limit: bool,
    min_confidence: u32,
}

impl From<&BuyScanParams> for ScanQuery {
    fn from(params: &BuyScanParams) -> Self {
        Self {
            amount: params.amount.max(0.0).round() as u64,
            top_n: params.top_n,
            no_trade_limit: params.no_trade_limit,
            no_signal_limit: params.no_signal_limit,
            no_budget_limit: params.no_budget_limit,
            min_confidence: params.min_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fastapi_detail_is_extracted() {
        assert_eq!(
            error_detail(br#"{"detail": "Unknown model: foo"}"#).as_deref(),
            Some("Unknown model: foo")
        );
        assert_eq!(error_detail(b"<html>502</html>"), None);
        assert_eq!(
            error_detail(br#"{"detail": [{"loc": ["body"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body"]}]"#)
        );
    }

    fn authorization(api: &HttpApi) -> Option<String> {
        let request = api
            .authorize(api.client.get(api.url("/api/balance")))
            .build()
            .unwrap();
        request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn bearer_token_is_attached_per_request() {
        let anonymous = HttpApi::new("http://example.test").unwrap();
        assert_eq!(authorization(&anonymous), None);

        let api = HttpApi::new("http://example.test")
            .unwrap()
            .with_credentials(Arc::new(StaticToken("s3cret".into())));
        assert_eq!(authorization(&api).as_deref(), Some("Bearer s3cret"));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let api = HttpApi::new("http://example.test/").unwrap();
        assert_eq!(api.url("/api/balance"), "http://example.test/api/balance");
    }

    #[test]
    fn buy_query_rounds_amount() {
        let params = BuyScanParams {
            amount: 10_000.4,
            top_n: 200,
            no_trade_limit: false,
            no_signal_limit: true,
            no_budget_limit: false,
            min_confidence: 0,
        };
        let query = ScanQuery::from(&params);
        assert_eq!(query.amount, 10_000);
        assert!(query.no_signal_limit);
    }
}
