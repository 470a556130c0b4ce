use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::shared::TaskHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediate,
    AfterPeriod,
}

/// Fire `tick` every `period` until it breaks or the handle goes away.
///
/// The callback is synchronous; anything slow belongs in a task it spawns,
/// so a long fetch never delays the next firing.
pub fn repeat<F>(period: Duration, first: FirstTick, mut tick: F) -> TaskHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    TaskHandle::spawn(async move {
        let start = match first {
            FirstTick::Immediate => Instant::now(),
            FirstTick::AfterPeriod => Instant::now() + period,
        };
        let mut interval = interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if tick().is_break() {
                break;
            }
        }
    })
}
