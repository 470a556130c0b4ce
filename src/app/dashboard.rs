use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use strum::IntoEnumIterator;

use crate::config::{API, AutomationConfig, SCHEDULE, StrategyId};
use crate::data::{
    ChannelEvent, ChannelState, DashboardApi, EventChannel, EventHandler, HttpApi, StaticToken,
};
use crate::engine::{
    CycleOptions, FetchFn, LogSink, PollKind, PollLoop, PollOptions, PollStats, RefreshHook,
    RevealSequencer, RunReport, ScanAction, ScanCycle, ThoughtFeed, ThoughtSink,
};
use crate::error::{Result, SyncError};
use crate::models::{
    LogEntry, PollResult, ScanResponse, ScanSide, Thought, mark_failed,
};
use crate::shared::Shared;

use super::state::{ControlFeedback, DashboardSnapshot, DashboardState};

/// Where the dashboard talks to and how often it polls.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub api_base: String,
    pub ws_url: String,
    pub poll_interval: Duration,
    /// Bearer token attached to every API request, if the server wants one.
    pub api_token: Option<String>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            api_base: API.base_url.to_string(),
            ws_url: API.ws_url.to_string(),
            poll_interval: SCHEDULE.poll_interval,
            api_token: None,
        }
    }
}

/// The five poll loops, shared with the channel handler and the scan
/// cycles' refresh hooks.
struct PollSet {
    balances: PollLoop<crate::models::BalanceSheet>,
    trades: PollLoop<crate::models::TradeFeed>,
    status: PollLoop<crate::models::AutomationStatus>,
    prices: PollLoop<crate::models::MarketPrices>,
    positions: PollLoop<crate::models::PositionsSnapshot>,
}

impl PollSet {
    fn new(api: &Arc<dyn DashboardApi>, state: &Shared<DashboardState>, interval: Duration) -> Self {
        Self {
            balances: poll_into(
                PollKind::Balances,
                interval,
                state,
                fetch_with(api, |api| async move { api.fetch_balances().await }),
                |s| &mut s.balances,
            ),
            trades: poll_into(
                PollKind::Trades,
                interval,
                state,
                fetch_with(api, |api| async move { api.fetch_trades().await }),
                |s| &mut s.trades,
            ),
            status: poll_into(
                PollKind::Status,
                interval,
                state,
                fetch_with(api, |api| async move { api.fetch_status().await }),
                |s| &mut s.status,
            ),
            prices: poll_into(
                PollKind::Prices,
                interval,
                state,
                fetch_with(api, |api| async move { api.fetch_prices().await }),
                |s| &mut s.prices,
            ),
            positions: poll_into(
                PollKind::Positions,
                interval,
                state,
                fetch_with(api, |api| async move { api.fetch_positions().await }),
                |s| &mut s.positions,
            ),
        }
    }

    fn start_deferred(&self) {
        self.balances.start_deferred();
        self.trades.start_deferred();
        self.status.start_deferred();
        self.prices.start_deferred();
        self.positions.start_deferred();
    }

    fn stop(&self) {
        self.balances.stop();
        self.trades.stop();
        self.status.stop();
        self.prices.stop();
        self.positions.stop();
    }

    fn trigger(&self, kind: PollKind) {
        match kind {
            PollKind::Balances => self.balances.trigger(),
            PollKind::Trades => self.trades.trigger(),
            PollKind::Status => self.status.trigger(),
            PollKind::Prices => self.prices.trigger(),
            PollKind::Positions => self.positions.trigger(),
        }
    }

    async fn tick_now(&self, kind: PollKind) -> Result<()> {
        match kind {
            PollKind::Balances => self.balances.tick_now().await,
            PollKind::Trades => self.trades.tick_now().await,
            PollKind::Status => self.status.tick_now().await,
            PollKind::Prices => self.prices.tick_now().await,
            PollKind::Positions => self.positions.tick_now().await,
        }
    }

    fn stats(&self, kind: PollKind) -> PollStats {
        match kind {
            PollKind::Balances => self.balances.stats(),
            PollKind::Trades => self.trades.stats(),
            PollKind::Status => self.status.stats(),
            PollKind::Prices => self.prices.stats(),
            PollKind::Positions => self.positions.stats(),
        }
    }
}

fn fetch_with<T, F, Fut>(api: &Arc<dyn DashboardApi>, call: F) -> FetchFn<T>
where
    T: 'static,
    F: Fn(Arc<dyn DashboardApi>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let api = api.clone();
    Arc::new(move || call(api.clone()).boxed())
}

/// Poll loop whose results land in one `DashboardState` slot.
fn poll_into<T: Send + 'static>(
    kind: PollKind,
    interval: Duration,
    state: &Shared<DashboardState>,
    fetch: FetchFn<T>,
    slot: fn(&mut DashboardState) -> &mut Option<PollResult<T>>,
) -> PollLoop<T> {
    let merge_state = state.clone();
    let error_state = state.clone();
    PollLoop::new(
        kind,
        interval,
        fetch,
        Arc::new(move |data: T| {
            merge_state.write(|s| *slot(s) = Some(PollResult::fresh(data)));
        }),
        PollOptions {
            on_error: Some(Arc::new(move |e: &SyncError| {
                error_state.write(|s| mark_failed(slot(s), e.to_string()));
            })),
            ..Default::default()
        },
    )
}

/// Apply one pushed event to the store.
fn dispatch(state: &Shared<DashboardState>, polls: &PollSet, event: ChannelEvent) {
    match event {
        ChannelEvent::Balances(lines) => state.write(|s| s.replace_balances(lines)),
        ChannelEvent::Trade => {
            polls.trigger(PollKind::Trades);
            polls.trigger(PollKind::Balances);
        }
        ChannelEvent::Signal(signal) => state.write(|s| s.signals.push(signal)),
        ChannelEvent::AutomationStarted => state.write(|s| s.set_automation_running(true)),
        ChannelEvent::AutomationStopped => state.write(|s| s.set_automation_running(false)),
        ChannelEvent::Ignored(_) => {}
    }
}

/// Client-side synchronization core of the trading dashboard.
///
/// Owns the shared store and every scheduler feeding it. All methods take
/// `&self`; the store is only touched through short synchronous closures.
pub struct Dashboard {
    api: Arc<dyn DashboardApi>,
    state: Shared<DashboardState>,
    polls: Arc<PollSet>,
    channel: EventChannel,
    buy: ScanCycle,
    sell: ScanCycle,
    reveal: RevealSequencer,
    thoughts: ThoughtFeed,
}

impl Dashboard {
    /// Dashboard over HTTP with the given endpoints.
    pub fn connect(settings: DashboardSettings) -> Result<Self> {
        let mut http = HttpApi::new(settings.api_base.clone())?;
        if let Some(token) = settings.api_token.clone() {
            http = http.with_credentials(Arc::new(StaticToken(token)));
        }
        let api: Arc<dyn DashboardApi> = Arc::new(http);
        Ok(Self::new(api, settings))
    }

    pub fn new(api: Arc<dyn DashboardApi>, settings: DashboardSettings) -> Self {
        let state = Shared::new(DashboardState::default());
        let polls = Arc::new(PollSet::new(&api, &state, settings.poll_interval));

        let handler: EventHandler = {
            let state = state.clone();
            let polls = polls.clone();
            Arc::new(move |event: ChannelEvent| dispatch(&state, &polls, event))
        };
        let channel = EventChannel::new(settings.ws_url, handler);

        let refresh: RefreshHook = {
            let polls = polls.clone();
            Arc::new(move || {
                polls.trigger(PollKind::Balances);
                polls.trigger(PollKind::Trades);
                polls.trigger(PollKind::Positions);
            })
        };
        let buy = ScanCycle::new(
            ScanSide::Buy,
            scan_action(&api, &state, ScanSide::Buy),
            scan_log(&state, ScanSide::Buy),
            CycleOptions {
                on_executed: Some(refresh.clone()),
                ..Default::default()
            },
        );
        let sell = ScanCycle::new(
            ScanSide::Sell,
            scan_action(&api, &state, ScanSide::Sell),
            scan_log(&state, ScanSide::Sell),
            CycleOptions {
                on_executed: Some(refresh),
                ..Default::default()
            },
        );

        let sink: ThoughtSink = {
            let state = state.clone();
            Arc::new(move |side: ScanSide, batch: Vec<Thought>| {
                state.write(|s| s.thoughts_mut(side).push_batch(batch));
            })
        };
        let thoughts = ThoughtFeed::new(api.clone(), sink);

        Self {
            api,
            state,
            polls,
            channel,
            buy,
            sell,
            reveal: RevealSequencer::default(),
            thoughts,
        }
    }

    /// Initial fan-out read, then periodic polling and the push channel.
    pub async fn mount(&self) {
        self.load_initial().await;
        self.polls.start_deferred();
        self.channel.connect();
        log::info!("Dashboard mounted");
    }

    /// One concurrent read of all five sources. Failures are recorded per
    /// source and don't hold up the others.
    pub async fn load_initial(&self) {
        let _ = tokio::join!(
            self.polls.tick_now(PollKind::Balances),
            self.polls.tick_now(PollKind::Trades),
            self.polls.tick_now(PollKind::Status),
            self.polls.tick_now(PollKind::Prices),
            self.polls.tick_now(PollKind::Positions),
        );
    }

    pub fn start_polling(&self) {
        self.polls.start_deferred();
    }

    /// Re-fetch every source in turn, plus the debate overview.
    pub async fn refresh_all(&self) {
        for kind in PollKind::iter() {
            let _ = self.polls.tick_now(kind).await;
        }
        self.load_debate_overview().await;
    }

    /// Re-tap one source outside its schedule.
    pub fn refresh(&self, kind: PollKind) {
        self.polls.trigger(kind);
    }

    pub fn apply_event(&self, event: ChannelEvent) {
        dispatch(&self.state, &self.polls, event);
    }

    // --- automation config & control ---

    pub fn config(&self) -> AutomationConfig {
        self.state.read(|s| s.config.clone())
    }

    pub fn update_config(&self, f: impl FnOnce(&mut AutomationConfig)) {
        self.state.write(|s| f(&mut s.config));
    }

    pub fn toggle_strategy(&self, id: StrategyId) {
        self.update_config(|c| c.toggle_strategy(id));
    }

    /// Push the current config, then start the server-side automation.
    pub async fn start_automation(&self) -> Result<()> {
        let request = self.state.read(|s| s.config.configure_request());
        let result = async {
            self.api.configure(&request).await?;
            self.api.start_automation().await
        }
        .await;

        match result {
            Ok(ack) => {
                self.state.write(|s| {
                    s.set_automation_running(true);
                    s.feedback = Some(ControlFeedback::accepted(
                        "start",
                        ack.message.unwrap_or_else(|| "자동매매 시작".to_string()),
                    ));
                });
                self.polls.trigger(PollKind::Status);
                Ok(())
            }
            Err(e) => Err(self.control_failed("start", e)),
        }
    }

    pub async fn stop_automation(&self) -> Result<()> {
        match self.api.stop_automation().await {
            Ok(ack) => {
                self.state.write(|s| {
                    s.set_automation_running(false);
                    s.feedback = Some(ControlFeedback::accepted(
                        "stop",
                        ack.message.unwrap_or_else(|| "자동매매 중지".to_string()),
                    ));
                });
                self.polls.trigger(PollKind::Status);
                Ok(())
            }
            Err(e) => Err(self.control_failed("stop", e)),
        }
    }

    pub async fn change_model(&self, model_key: &str) -> Result<()> {
        match self.api.change_model(model_key).await {
            Ok(_) => {
                self.state.write(|s| {
                    s.selected_model = Some(model_key.to_string());
                    s.feedback = Some(ControlFeedback::accepted(
                        "model",
                        format!("AI 모델 변경: {model_key}"),
                    ));
                });
                Ok(())
            }
            Err(e) => Err(self.control_failed("model", e)),
        }
    }

    fn control_failed(&self, action: &str, error: SyncError) -> SyncError {
        log::warn!("{} failed: {}", action, error);
        self.state
            .write(|s| s.feedback = Some(ControlFeedback::failed(action, &error)));
        error
    }

    pub fn clear_feedback(&self) {
        self.state.write(|s| s.feedback = None);
    }

    // --- debates ---

    /// Run a debate on `ticker` and replay it through the reveal sequencer.
    pub async fn run_debate(&self, ticker: &str) -> Result<()> {
        let result = crate::trace_time!(format!("debate {ticker}"), 15_000, {
            self.api.run_debate(ticker).await
        });
        match result {
            Ok(result) => {
                self.reveal.present(result);
                self.load_debate_overview().await;
                Ok(())
            }
            Err(e) => {
                log::warn!("Debate on {} failed: {}", ticker, e);
                Err(e)
            }
        }
    }

    pub async fn load_debate_overview(&self) {
        let (history, picks) = tokio::join!(
            self.api.fetch_debate_history(),
            self.api.fetch_top_picks()
        );
        match history {
            Ok(history) => self.state.write(|s| s.debate_history = Some(history)),
            Err(e) => log::warn!("Debate history fetch failed: {}", e),
        }
        match picks {
            Ok(picks) => self.state.write(|s| s.top_picks = Some(picks)),
            Err(e) => log::warn!("Top picks fetch failed: {}", e),
        }
    }

    pub fn reveal(&self) -> &RevealSequencer {
        &self.reveal
    }

    // --- scan cycles ---

    fn cycle(&self, side: ScanSide) -> &ScanCycle {
        match side {
            ScanSide::Buy => &self.buy,
            ScanSide::Sell => &self.sell,
        }
    }

    pub async fn run_buy_scan(&self) -> RunReport {
        self.buy.run().await
    }

    pub async fn run_sell_scan(&self) -> RunReport {
        self.sell.run().await
    }

    pub fn enable_auto_buy(&self) {
        self.buy.enable_auto();
    }

    pub fn disable_auto_buy(&self) {
        self.buy.disable_auto();
    }

    pub fn enable_auto_sell(&self) {
        self.sell.enable_auto();
    }

    pub fn disable_auto_sell(&self) {
        self.sell.disable_auto();
    }

    pub fn clear_scan_log(&self, side: ScanSide) {
        self.state.write(|s| s.scan_log_mut(side).clear());
    }

    // --- thoughts ---

    pub fn enable_thoughts(&self) {
        self.thoughts.enable();
    }

    pub fn disable_thoughts(&self) {
        self.thoughts.disable();
    }

    // --- projections ---

    pub fn state(&self) -> DashboardState {
        self.state.snapshot()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            state: self.state.snapshot(),
            channel: self.channel.state(),
            buy_cycle: self.buy.state(),
            sell_cycle: self.sell.state(),
            auto_buy: self.cycle(ScanSide::Buy).is_auto(),
            auto_sell: self.cycle(ScanSide::Sell).is_auto(),
            reveal: self.reveal.state(),
            thoughts: self.thoughts.state(),
            poll_stats: PollKind::iter()
                .map(|kind| (kind, self.polls.stats(kind)))
                .collect(),
        }
    }

    /// Stop every loop, timer and the channel. Runs already in flight
    /// finish on their own; nothing they return is merged by a poll loop.
    pub fn shutdown(&self) {
        self.polls.stop();
        self.buy.disable_auto();
        self.sell.disable_auto();
        self.thoughts.disable();
        self.reveal.cancel();
        self.channel.shutdown();
        log::info!("Dashboard shut down");
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn scan_action(api: &Arc<dyn DashboardApi>, state: &Shared<DashboardState>, side: ScanSide) -> ScanAction {
    let api = api.clone();
    let state = state.clone();
    Arc::new(move || {
        let api = api.clone();
        match side {
            ScanSide::Buy => {
                let params = state.read(|s| s.config.buy_scan_params(API.scan_top_n));
                async move { api.scan_and_buy(&params).await.map(ScanResponse::Buy) }.boxed()
            }
            ScanSide::Sell => {
                let params = state.read(|s| s.config.sell_scan_params());
                async move { api.scan_and_sell(&params).await.map(ScanResponse::Sell) }.boxed()
            }
        }
    })
}

fn scan_log(state: &Shared<DashboardState>, side: ScanSide) -> LogSink {
    let state = state.clone();
    Arc::new(move |entry: LogEntry| state.write(|s| s.scan_log_mut(side).push(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ControlAck;
    use crate::models::{
        AutomationStatus, Balance, BalanceSheet, BoughtItem, BuyScanResponse, DebateMessage,
        DebateResult, LogStatus, Signal, TradeFeed,
    };
    use crate::testing::{FakeApi, Reply};
    use tokio::time::sleep;

    fn dashboard() -> (Arc<FakeApi>, Dashboard) {
        let api = Arc::new(FakeApi::default());
        let settings = DashboardSettings {
            api_base: "http://test".into(),
            ws_url: "ws://test/ws".into(),
            poll_interval: Duration::from_secs(5),
            api_token: None,
        };
        let dashboard = Dashboard::new(api.clone(), settings);
        (api, dashboard)
    }

    fn wallet(krw: f64) -> BalanceSheet {
        BalanceSheet::from_balances(vec![Balance {
            currency: "KRW".into(),
            balance: krw,
            eval_amount: krw,
            ..Default::default()
        }])
    }

    /// Let spawned re-taps run.
    async fn settle() {
        sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn initial_load_reads_every_source_once() {
        let (api, dashboard) = dashboard();
        FakeApi::set(&api.balances, Reply::Ok(wallet(70_000.0)));

        dashboard.load_initial().await;

        for endpoint in [
            "fetch_balances",
            "fetch_trades",
            "fetch_status",
            "fetch_prices",
            "fetch_positions",
        ] {
            assert_eq!(api.calls_to(endpoint), 1, "{endpoint}");
        }
        let state = dashboard.state();
        assert_eq!(state.krw_balance(), 70_000.0);
        assert!(state.trades.is_some());
        assert!(state.positions.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_source_keeps_stale_data_while_others_refresh() {
        let (api, dashboard) = dashboard();
        dashboard.load_initial().await;
        FakeApi::set(&api.prices, Reply::Transport("upbit unreachable".into()));
        FakeApi::set(&api.balances, Reply::Ok(wallet(1_234.0)));

        dashboard.start_polling();
        sleep(Duration::from_secs(11)).await;

        let state = dashboard.state();
        assert_eq!(state.krw_balance(), 1_234.0);
        let prices = state.prices.as_ref().unwrap();
        assert_eq!(prices.error.as_deref(), Some("transport error: upbit unreachable"));
        assert_eq!(api.calls_to("fetch_prices"), 3);
        assert_eq!(api.calls_to("fetch_balances"), 3);
        dashboard.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn auto_buy_logs_and_refreshes() {
        let (api, dashboard) = dashboard();
        FakeApi::set(
            &api.buy_scan,
            Reply::Ok(BuyScanResponse {
                bought: vec![BoughtItem {
                    ticker: "KRW-BTC".into(),
                    votes: 3,
                    amount: None,
                }],
                ..Default::default()
            }),
        );
        api.delay("scan_and_buy", Duration::from_secs(4));

        dashboard.enable_auto_buy();
        settle().await;
        assert!(dashboard.snapshot().buy_cycle.running);

        sleep(Duration::from_secs(5)).await;
        let snapshot = dashboard.snapshot();
        assert!(!snapshot.buy_cycle.running);
        assert!(snapshot.auto_buy);
        let log: Vec<(LogStatus, String)> = snapshot
            .state
            .buy_log
            .iter()
            .map(|e| (e.status, e.message.clone()))
            .collect();
        assert_eq!(
            log,
            vec![
                (LogStatus::Success, "✅ 1개 매수 완료 (4초)".to_string()),
                (LogStatus::Running, "AI 3대장 매수 분석 시작...".to_string()),
            ]
        );
        assert!(snapshot.state.sell_log.is_empty());

        // balances, trades and positions re-fetched; status untouched
        assert_eq!(api.calls_to("fetch_balances"), 1);
        assert_eq!(api.calls_to("fetch_trades"), 1);
        assert_eq!(api.calls_to("fetch_positions"), 1);
        assert_eq!(api.calls_to("fetch_status"), 0);

        let params = api.last_buy_params().unwrap();
        assert_eq!(params.amount, 10_000.0);
        assert_eq!(params.min_confidence, 70);
        assert_eq!(params.top_n, 200);
        dashboard.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn unlimited_flags_reach_the_scan_request() {
        let (api, dashboard) = dashboard();
        dashboard.update_config(|c| {
            c.unlimited.trade = true;
            c.unlimited.signal = true;
        });

        dashboard.run_buy_scan().await;

        let params = api.last_buy_params().unwrap();
        assert_eq!(params.amount, 0.0);
        assert_eq!(params.min_confidence, 0);
        assert!(params.no_trade_limit);
        assert!(params.no_signal_limit);
        assert!(!params.no_budget_limit);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_start_is_reported_inline() {
        let (api, dashboard) = dashboard();
        FakeApi::set(
            &api.status,
            Reply::Ok(AutomationStatus {
                is_running: false,
                ..Default::default()
            }),
        );
        dashboard.load_initial().await;
        FakeApi::set(&api.control, Reply::Reject("strategies must not be empty".into()));

        let err = dashboard.start_automation().await.unwrap_err();

        assert!(err.is_rejection());
        let state = dashboard.state();
        let feedback = state.feedback.unwrap();
        assert!(feedback.rejected);
        assert_eq!(feedback.message, "strategies must not be empty");
        assert!(!state.status.unwrap().data.is_running);
        // configure failed, so start was never sent
        assert_eq!(api.calls_to("start_automation"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_sends_config_then_flips_running() {
        let (api, dashboard) = dashboard();
        dashboard.load_initial().await;
        FakeApi::set(
            &api.control,
            Reply::Ok(ControlAck {
                status: Some("started".into()),
                ..Default::default()
            }),
        );
        dashboard.toggle_strategy(StrategyId::RsiReversal);

        dashboard.start_automation().await.unwrap();

        let request = api.last_configure().unwrap();
        assert!(!request.strategies.contains(&StrategyId::RsiReversal));
        assert_eq!(request.max_positions, 3);
        assert_eq!(
            api.call_log().iter().filter(|c| !c.starts_with("fetch")).collect::<Vec<_>>(),
            vec!["configure", "start_automation"]
        );
        let state = dashboard.state();
        assert!(state.automation_running());
        assert!(state.feedback.unwrap().ok);
    }

    #[tokio::test(start_paused = true)]
    async fn channel_events_update_the_store() {
        let (api, dashboard) = dashboard();
        dashboard.load_initial().await;

        dashboard.apply_event(ChannelEvent::Balances(wallet(5_000.0).balances));
        assert_eq!(dashboard.state().krw_balance(), 5_000.0);

        dashboard.apply_event(ChannelEvent::Trade);
        settle().await;
        assert_eq!(api.calls_to("fetch_trades"), 2);
        assert_eq!(api.calls_to("fetch_balances"), 2);

        for strength in 0..12 {
            dashboard.apply_event(ChannelEvent::Signal(Signal {
                ticker: "KRW-ETH".into(),
                strength: strength as f64,
                ..Default::default()
            }));
        }
        let signals = dashboard.state().signals;
        assert_eq!(signals.len(), 10);
        assert_eq!(signals.latest().unwrap().strength, 11.0);

        dashboard.apply_event(ChannelEvent::AutomationStarted);
        assert!(dashboard.state().automation_running());
        dashboard.apply_event(ChannelEvent::AutomationStopped);
        assert!(!dashboard.state().automation_running());

        dashboard.apply_event(ChannelEvent::Ignored("pong".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn debate_is_revealed_and_overview_refreshed() {
        let (api, dashboard) = dashboard();
        FakeApi::set(
            &api.debate,
            Reply::Ok(DebateResult {
                ticker: "KRW-SOL".into(),
                messages: (0..3)
                    .map(|i| DebateMessage {
                        id: format!("m{i}"),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }),
        );

        dashboard.run_debate("KRW-SOL").await.unwrap();
        assert_eq!(api.calls_to("fetch_debate_history"), 1);
        assert_eq!(api.calls_to("fetch_top_picks"), 1);

        sleep(Duration::from_secs(4)).await;
        let reveal = dashboard.snapshot().reveal;
        assert_eq!(reveal.ticker.as_deref(), Some("KRW-SOL"));
        assert_eq!(reveal.displayed.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn model_change_records_selection() {
        let (api, dashboard) = dashboard();
        dashboard.change_model("gemini").await.unwrap();
        assert_eq!(dashboard.state().selected_model.as_deref(), Some("gemini"));

        FakeApi::set(&api.control, Reply::Reject("Unknown model: foo".into()));
        assert!(dashboard.change_model("foo").await.is_err());
        let state = dashboard.state();
        assert_eq!(state.selected_model.as_deref(), Some("gemini"));
        assert_eq!(state.feedback.unwrap().message, "Unknown model: foo");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_silences_every_loop() {
        let (api, dashboard) = dashboard();
        FakeApi::set(&api.trades, Reply::Ok(TradeFeed::default()));
        dashboard.load_initial().await;
        dashboard.start_polling();
        dashboard.enable_auto_sell();
        dashboard.enable_thoughts();
        sleep(Duration::from_secs(6)).await;

        dashboard.shutdown();
        let before = api.call_log().len();
        sleep(Duration::from_secs(300)).await;

        assert_eq!(api.call_log().len(), before);
        let snapshot = dashboard.snapshot();
        assert!(!snapshot.auto_sell);
        assert!(!snapshot.channel.connected);
        assert!(snapshot.poll_stats.iter().all(|(_, stats)| stats.failures == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_all_reads_everything_in_turn() {
        let (api, dashboard) = dashboard();
        dashboard.refresh_all().await;
        assert_eq!(
            api.call_log(),
            vec![
                "fetch_balances",
                "fetch_trades",
                "fetch_status",
                "fetch_prices",
                "fetch_positions",
                "fetch_debate_history",
                "fetch_top_picks",
            ]
        );
    }
}
