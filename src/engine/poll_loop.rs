use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use strum_macros::{Display, EnumIter};

use crate::error::{Result, SyncError};
use crate::shared::{Shared, TaskHandle};

use super::timer::{FirstTick, repeat};

#[cfg(debug_assertions)]
use crate::config::DF;

/// The five server reads kept fresh by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PollKind {
    Balances,
    Trades,
    Status,
    Prices,
    Positions,
}

/// Which response wins when two requests of one loop overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeOrder {
    /// Whichever response arrives last is merged last.
    #[default]
    LastArrival,
    /// Responses to requests older than the last merged one are dropped.
    NewestRequest,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollStats {
    pub ticks: u64,
    pub failures: u64,
    pub stale_drops: u64,
    pub last_error: Option<String>,
}

pub type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;
pub type MergeFn<T> = Arc<dyn Fn(T) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&SyncError) + Send + Sync>;

#[derive(Clone, Default)]
pub struct PollOptions {
    pub order: MergeOrder,
    pub on_error: Option<ErrorHook>,
}

#[derive(Debug, Default)]
struct MergeGate {
    generation: u64,
    last_merged: u64,
}

struct PollCore<T> {
    kind: PollKind,
    order: MergeOrder,
    fetch: FetchFn<T>,
    merge: MergeFn<T>,
    on_error: Option<ErrorHook>,
    next_request: AtomicU64,
    gate: Shared<MergeGate>,
    stats: Shared<PollStats>,
}

/// Periodically fetches one remote read and merges the result.
///
/// Every tick spawns its own fetch, so a slow response never delays the
/// next tick and a failing loop never affects its siblings.
pub struct PollLoop<T> {
    interval: Duration,
    core: Arc<PollCore<T>>,
    timer: Shared<Option<TaskHandle>>,
}

impl<T: Send + 'static> PollLoop<T> {
    pub fn new(
        kind: PollKind,
        interval: Duration,
        fetch: FetchFn<T>,
        merge: MergeFn<T>,
        options: PollOptions,
    ) -> Self {
        Self {
            interval,
            core: Arc::new(PollCore {
                kind,
                order: options.order,
                fetch,
                merge,
                on_error: options.on_error,
                next_request: AtomicU64::new(0),
                gate: Shared::default(),
                stats: Shared::default(),
            }),
            timer: Shared::new(None),
        }
    }

    pub fn kind(&self) -> PollKind {
        self.core.kind
    }

    /// Tick now, then every interval.
    pub fn start(&self) {
        self.start_with(FirstTick::Immediate);
    }

    /// First tick one interval from now.
    pub fn start_deferred(&self) {
        self.start_with(FirstTick::AfterPeriod);
    }

    fn start_with(&self, first: FirstTick) {
        self.timer.write(|timer| {
            if timer.is_some() {
                return;
            }
            let core = self.core.clone();
            let generation = core.gate.read(|g| g.generation);
            *timer = Some(repeat(self.interval, first, move || {
                spawn_tick(core.clone(), generation);
                ControlFlow::Continue(())
            }));
        });
    }

    /// Cancel the timer. Requests already in flight complete but their
    /// results are discarded.
    pub fn stop(&self) {
        if let Some(timer) = self.timer.write(Option::take) {
            timer.cancel();
        }
        self.core.gate.write(|g| g.generation += 1);
    }

    pub fn is_running(&self) -> bool {
        self.timer.read(Option::is_some)
    }

    /// Detached out-of-schedule fetch, e.g. after a pushed trade.
    pub fn trigger(&self) {
        let generation = self.core.gate.read(|g| g.generation);
        spawn_tick(self.core.clone(), generation);
    }

    /// One fetch-and-merge, awaited. Errors are also reported through the
    /// loop's usual path.
    pub async fn tick_now(&self) -> Result<()> {
        let generation = self.core.gate.read(|g| g.generation);
        run_tick(self.core.clone(), generation).await
    }

    pub fn stats(&self) -> PollStats {
        self.core.stats.snapshot()
    }
}

impl<T> Drop for PollLoop<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.write(Option::take) {
            timer.cancel();
        }
    }
}

fn spawn_tick<T: Send + 'static>(core: Arc<PollCore<T>>, generation: u64) {
    tokio::spawn(async move {
        let _ = run_tick(core, generation).await;
    });
}

async fn run_tick<T>(core: Arc<PollCore<T>>, generation: u64) -> Result<()> {
    let request = core.next_request.fetch_add(1, Ordering::SeqCst) + 1;
    core.stats.write(|s| s.ticks += 1);

    let fetched = crate::trace_time!(core.kind, 2000, { (core.fetch)().await });

    match fetched {
        Ok(data) => {
            let merged = core.gate.write(|gate| {
                if gate.generation != generation {
                    return false;
                }
                if core.order == MergeOrder::NewestRequest && request < gate.last_merged {
                    return false;
                }
                gate.last_merged = gate.last_merged.max(request);
                (core.merge)(data);
                true
            });

            if merged {
                #[cfg(debug_assertions)]
                if DF.log_poll_ticks {
                    log::info!("[poll:{}] merged request #{}", core.kind, request);
                }
            } else {
                core.stats.write(|s| s.stale_drops += 1);
                #[cfg(debug_assertions)]
                if DF.log_poll_ticks {
                    log::info!("[poll:{}] dropped stale request #{}", core.kind, request);
                }
            }
            Ok(())
        }
        Err(e) => {
            if core.gate.read(|g| g.generation) != generation {
                core.stats.write(|s| s.stale_drops += 1);
                return Err(e);
            }
            log::warn!("{} poll failed: {}", core.kind, e);
            core.stats.write(|s| {
                s.failures += 1;
                s.last_error = Some(e.to_string());
            });
            if let Some(hook) = &core.on_error {
                hook(&e);
            }
            Err(e)
        }
    }
}
