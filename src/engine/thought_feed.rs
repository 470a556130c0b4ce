use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::{LOGS, SCHEDULE};
use crate::data::DashboardApi;
use crate::models::{ScanSide, Thought, ThoughtKind};
use crate::shared::{Shared, TaskHandle};
use crate::utils::now_local;

use super::timer::{FirstTick, repeat};

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThoughtFeedState {
    pub analyzing: bool,
    pub last_round_at: Option<DateTime<Local>>,
    pub rounds: u64,
}

/// Receives thoughts for one side, newest batch first.
pub type ThoughtSink = Arc<dyn Fn(ScanSide, Vec<Thought>) + Send + Sync>;

struct FeedCore {
    api: Arc<dyn DashboardApi>,
    sink: ThoughtSink,
    deadline: Duration,
    state: Shared<ThoughtFeedState>,
}

/// Periodic lightweight market commentary for the buy and sell panels.
pub struct ThoughtFeed {
    period: Duration,
    core: Arc<FeedCore>,
    timer: Shared<Option<TaskHandle>>,
}

impl ThoughtFeed {
    pub fn new(api: Arc<dyn DashboardApi>, sink: ThoughtSink) -> Self {
        Self {
            period: SCHEDULE.thought_period,
            core: Arc::new(FeedCore {
                api,
                sink,
                deadline: SCHEDULE.thought_timeout,
                state: Shared::default(),
            }),
            timer: Shared::new(None),
        }
    }

    pub fn state(&self) -> ThoughtFeedState {
        self.core.state.snapshot()
    }

    pub fn is_enabled(&self) -> bool {
        self.timer.read(Option::is_some)
    }

    pub fn enable(&self) {
        self.timer.write(|timer| {
            if timer.is_some() {
                return;
            }
            let core = self.core.clone();
            *timer = Some(repeat(self.period, FirstTick::Immediate, move || {
                let core = core.clone();
                tokio::spawn(async move {
                    run_round(core).await;
                });
                ControlFlow::Continue(())
            }));
        });
    }

    pub fn disable(&self) {
        if let Some(timer) = self.timer.write(Option::take) {
            timer.cancel();
        }
    }

    /// One analysis round. Returns false if a round was already running.
    pub async fn run_round(&self) -> bool {
        run_round(self.core.clone()).await
    }
}

impl Drop for ThoughtFeed {
    fn drop(&mut self) {
        self.disable();
    }
}

struct AnalyzingGuard(Shared<ThoughtFeedState>);

impl Drop for AnalyzingGuard {
    fn drop(&mut self) {
        self.0.write(|s| s.analyzing = false);
    }
}

async fn run_round(core: Arc<FeedCore>) -> bool {
    let acquired = core.state.write(|s| {
        if s.analyzing {
            return false;
        }
        s.analyzing = true;
        s.last_round_at = Some(now_local());
        s.rounds += 1;
        true
    });
    if !acquired {
        return false;
    }
    let _guard = AnalyzingGuard(core.state.clone());

    let round = async {
        analyze(&core, ScanSide::Buy).await;
        analyze(&core, ScanSide::Sell).await;
    };
    if tokio::time::timeout(core.deadline, round).await.is_err() {
        log::warn!(
            "Thought round cut off after {}s",
            core.deadline.as_secs()
        );
        (core.sink)(
            ScanSide::Buy,
            vec![Thought::new(ThoughtKind::Error, "⚠️ 분석 중단됨")],
        );
    }
    true
}

async fn analyze(core: &FeedCore, side: ScanSide) {
    let scanning = match side {
        ScanSide::Buy => "🔍 전체 코인 시장 스캔 중...",
        ScanSide::Sell => "📊 보유 코인 분석 중...",
    };
    (core.sink)(side, vec![Thought::new(ThoughtKind::Scanning, scanning)]);

    let analysis = match core.api.quick_analysis(side).await {
        Ok(response) => response.analysis,
        Err(e) => {
            log::warn!("{} quick analysis failed: {}", side, e);
            return;
        }
    };
    let Some(analysis) = analysis else {
        return;
    };

    let batch: Vec<Thought> = analysis
        .signals
        .into_iter()
        .take(LOGS.thought_batch)
        .map(|signal| Thought::new(ThoughtKind::Analysis, signal))
        .collect();

    #[cfg(debug_assertions)]
    if DF.log_thoughts {
        log::info!("[thoughts:{}] {} signals", side, batch.len());
    }

    if batch.is_empty() {
        let quiet = match side {
            ScanSide::Buy => "📊 시장 안정 - 특이 시그널 없음",
            ScanSide::Sell => "📊 보유 코인 안정적",
        };
        let text = analysis.summary.unwrap_or_else(|| quiet.to_string());
        (core.sink)(side, vec![Thought::new(ThoughtKind::Info, text)]);
    } else {
        (core.sink)(side, batch);
    }
}
