use std::time::Duration;

/// Where the trading server lives and how hard we lean on it.
pub struct ApiConfig {
    pub base_url: &'static str,
    pub ws_url: &'static str,
    /// Per-request ceiling for plain reads and control calls.
    pub request_timeout: Duration,
    /// Ceiling for a scan-and-act call. Hitting it counts as a failed scan.
    pub scan_timeout: Duration,
    /// Market index tickers polled for the header prices.
    pub index_tickers: &'static [&'static str],
    pub trades_limit: u32,
    pub debate_history_limit: u32,
    pub top_picks: u32,
    pub scan_top_n: u32,
    pub quick_analysis_limit: u32,
}

pub const API: ApiConfig = ApiConfig {
    base_url: "http://localhost:8000",
    ws_url: "ws://localhost:8000/ws",
    request_timeout: Duration::from_secs(10),
    scan_timeout: Duration::from_secs(25),
    index_tickers: &["KRW-BTC", "KRW-ETH"],
    trades_limit: 50,
    debate_history_limit: 5,
    top_picks: 3,
    scan_top_n: 200,
    quick_analysis_limit: 5,
};
