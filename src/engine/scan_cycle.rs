use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use futures::future::BoxFuture;

use crate::config::{API, SCHEDULE};
use crate::error::{Result, SyncError};
use crate::models::{LogEntry, LogStatus, ScanOutcome, ScanResponse, ScanSide};
use crate::shared::{Shared, TaskHandle};
use crate::utils::{AppInstant, now_local, round_secs};

use super::timer::{FirstTick, repeat};

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanCycleState {
    pub running: bool,
    pub elapsed_seconds: u64,
    pub started_at: Option<DateTime<Local>>,
    pub last_result: Option<ScanOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    /// Another run held the cycle.
    Skipped,
    Completed(ScanOutcome),
}

/// The remote scan-and-act call. Builds its parameters at call time so the
/// latest automation config is used.
pub type ScanAction = Arc<dyn Fn() -> BoxFuture<'static, Result<ScanResponse>> + Send + Sync>;
pub type LogSink = Arc<dyn Fn(LogEntry) + Send + Sync>;
pub type RefreshHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct CycleOptions {
    /// Called after a run that executed at least one trade.
    pub on_executed: Option<RefreshHook>,
    pub timeout: Duration,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            on_executed: None,
            timeout: API.scan_timeout,
        }
    }
}

struct CycleCore {
    side: ScanSide,
    action: ScanAction,
    log: LogSink,
    options: CycleOptions,
    state: Shared<ScanCycleState>,
}

/// A scan-and-act automation guarded so that at most one run is active.
#[derive(Clone)]
pub struct ScanCycle {
    core: Arc<CycleCore>,
    auto: Shared<Option<TaskHandle>>,
}

impl ScanCycle {
    pub fn new(side: ScanSide, action: ScanAction, log: LogSink, options: CycleOptions) -> Self {
        Self {
            core: Arc::new(CycleCore {
                side,
                action,
                log,
                options,
                state: Shared::default(),
            }),
            auto: Shared::new(None),
        }
    }

    pub fn side(&self) -> ScanSide {
        self.core.side
    }

    pub fn state(&self) -> ScanCycleState {
        self.core.state.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.core.state.read(|s| s.running)
    }

    /// One guarded run. Returns `Skipped` without side effects while a run
    /// is already in progress.
    pub async fn run(&self) -> RunReport {
        run_cycle(self.core.clone()).await
    }

    /// Run now, then every auto-scan period whenever the cycle is idle.
    pub fn enable_auto(&self) {
        self.auto.write(|auto| {
            if auto.is_some() {
                return;
            }
            let core = self.core.clone();
            *auto = Some(repeat(SCHEDULE.auto_scan_period, FirstTick::Immediate, move || {
                if !core.state.read(|s| s.running) {
                    let core = core.clone();
                    tokio::spawn(async move {
                        run_cycle(core).await;
                    });
                }
                ControlFlow::Continue(())
            }));
        });
        log::info!("Auto {} scan enabled", self.core.side);
    }

    /// Stop auto-repeating. A run in progress is left to finish.
    pub fn disable_auto(&self) {
        if let Some(timer) = self.auto.write(Option::take) {
            timer.cancel();
            log::info!("Auto {} scan disabled", self.core.side);
        }
    }

    pub fn is_auto(&self) -> bool {
        self.auto.read(Option::is_some)
    }
}

/// Clears `running` and stops the elapsed ticker however the run ends,
/// including a panic in the remote call or the run future being dropped.
struct RunningGuard {
    state: Shared<ScanCycleState>,
    _ticker: TaskHandle,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.state.write(|s| s.running = false);
    }
}

async fn run_cycle(core: Arc<CycleCore>) -> RunReport {
    let acquired = core.state.write(|s| {
        if s.running {
            return false;
        }
        s.running = true;
        s.elapsed_seconds = 0;
        s.started_at = Some(now_local());
        true
    });
    if !acquired {
        #[cfg(debug_assertions)]
        if DF.log_scan_cycle {
            log::debug!("{} scan already running, skipping", core.side);
        }
        return RunReport::Skipped;
    }

    let started = AppInstant::now();
    let ticker_state = core.state.clone();
    let _guard = RunningGuard {
        state: core.state.clone(),
        _ticker: repeat(SCHEDULE.elapsed_tick, FirstTick::AfterPeriod, move || {
            ticker_state.write(|s| s.elapsed_seconds += 1);
            ControlFlow::Continue(())
        }),
    };

    let verb = core.side.verb();
    (core.log)(LogEntry::new(
        LogStatus::Running,
        format!("AI 3대장 {verb} 분석 시작..."),
        None,
    ));

    let result = crate::trace_time!(format!("{} scan", core.side), 15_000, {
        tokio::time::timeout(core.options.timeout, (core.action)()).await
    });
    let secs = round_secs(started.elapsed());

    let outcome = match result {
        Ok(Ok(response)) if response.executed_count() > 0 => {
            (core.log)(LogEntry::new(
                LogStatus::Success,
                format!("✅ {}개 {verb} 완료 ({secs}초)", response.executed_count()),
                Some(response.executed_summary()),
            ));
            if let Some(refresh) = &core.options.on_executed {
                refresh();
            }
            ScanOutcome::Executed { response }
        }
        Ok(Ok(response)) => {
            (core.log)(LogEntry::new(
                LogStatus::Info,
                format!("📊 분석 완료 - {verb} 조건 미충족 ({secs}초)"),
                response.advisory(),
            ));
            ScanOutcome::NoAction { response }
        }
        Ok(Err(e)) => failed(&core, e),
        Err(_) => failed(&core, SyncError::Timeout(core.options.timeout)),
    };

    #[cfg(debug_assertions)]
    if DF.log_scan_cycle {
        log::info!("{} scan finished in {}s", core.side, secs);
    }

    core.state.write(|s| s.last_result = Some(outcome.clone()));
    RunReport::Completed(outcome)
}

fn failed(core: &CycleCore, error: SyncError) -> ScanOutcome {
    log::warn!("{} scan failed: {}", core.side, error);
    let message = error.to_string();
    (core.log)(LogEntry::new(
        LogStatus::Error,
        format!("❌ 오류 발생: {message}"),
        None,
    ));
    ScanOutcome::Failed { message }
}
