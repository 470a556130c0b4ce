use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::config::SCHEDULE;
use crate::models::{DebateMessage, DebateResult};
use crate::shared::{Shared, TaskHandle};

use super::timer::{FirstTick, repeat};

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealState {
    pub ticker: Option<String>,
    pub displayed: Vec<DebateMessage>,
    pub pending: VecDeque<DebateMessage>,
    /// The debate being replayed; its verdict is shown once `pending` drains.
    pub result: Option<DebateResult>,
}

impl RevealState {
    pub fn is_complete(&self) -> bool {
        self.result.is_some() && self.pending.is_empty()
    }
}

#[derive(Debug, Default)]
struct RevealInner {
    state: RevealState,
    /// Bumped by every `present`; firings from an older sequence are ignored.
    epoch: u64,
    /// Every step attempted, stale and empty ones included.
    steps: u64,
}

#[derive(Debug, PartialEq)]
enum RevealStep {
    Moved { remaining: usize },
    Empty,
    Stale,
}

/// Replays a finished debate one message per interval so it reads like a
/// live discussion.
pub struct RevealSequencer {
    interval: Duration,
    inner: Shared<RevealInner>,
    timer: Shared<Option<TaskHandle>>,
}

impl Default for RevealSequencer {
    fn default() -> Self {
        Self::new(SCHEDULE.reveal_interval)
    }
}

impl RevealSequencer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            inner: Shared::default(),
            timer: Shared::new(None),
        }
    }

    /// Start replaying `result`, abandoning whatever was being revealed.
    pub fn present(&self, result: DebateResult) {
        self.cancel();

        let (epoch, count) = self.inner.write(|inner| {
            inner.epoch += 1;
            inner.state = RevealState {
                ticker: Some(result.ticker.clone()),
                displayed: Vec::with_capacity(result.messages.len()),
                pending: result.messages.iter().cloned().collect(),
                result: Some(result),
            };
            (inner.epoch, inner.state.pending.len())
        });

        #[cfg(debug_assertions)]
        if DF.log_reveal {
            log::info!("Revealing {} debate messages (sequence {})", count, epoch);
        }

        if count == 0 {
            return;
        }

        let inner = self.inner.clone();
        let handle = repeat(self.interval, FirstTick::Immediate, move || {
            match reveal_step(&inner, epoch) {
                RevealStep::Moved { remaining } if remaining > 0 => ControlFlow::Continue(()),
                _ => ControlFlow::Break(()),
            }
        });
        self.timer.write(|timer| *timer = Some(handle));
    }

    /// Move the next pending message onto the display. Returns false when
    /// nothing was pending.
    pub fn reveal(&self) -> bool {
        let epoch = self.inner.read(|inner| inner.epoch);
        matches!(reveal_step(&self.inner, epoch), RevealStep::Moved { .. })
    }

    pub fn is_revealing(&self) -> bool {
        self.timer
            .read(|timer| timer.as_ref().is_some_and(|t| !t.is_finished()))
    }

    pub fn state(&self) -> RevealState {
        self.inner.read(|inner| inner.state.clone())
    }

    /// Stop the running sequence, leaving the displayed messages in place.
    pub fn cancel(&self) {
        if let Some(timer) = self.timer.write(Option::take) {
            timer.cancel();
        }
    }
}

fn reveal_step(inner: &Shared<RevealInner>, epoch: u64) -> RevealStep {
    inner.write(|inner| {
        inner.steps += 1;
        if inner.epoch != epoch {
            return RevealStep::Stale;
        }
        match inner.state.pending.pop_front() {
            Some(message) => {
                inner.state.displayed.push(message);
                RevealStep::Moved {
                    remaining: inner.state.pending.len(),
                }
            }
            None => RevealStep::Empty,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn debate(ticker: &str, experts: &[&str]) -> DebateResult {
        DebateResult {
            ticker: ticker.to_string(),
            messages: experts
                .iter()
                .enumerate()
                .map(|(i, name)| DebateMessage {
                    id: format!("{ticker}-{i}"),
                    expert_name: name.to_string(),
                    content: format!("{name} on {ticker}"),
                    ..Default::default()
                })
                .collect(),
            consensus: "buy".into(),
            ..Default::default()
        }
    }

    fn ids(state: &RevealState) -> Vec<String> {
        state.displayed.iter().map(|m| m.id.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_in_order_one_per_interval() {
        let sequencer = RevealSequencer::default();
        sequencer.present(debate("KRW-BTC", &["claude", "gpt", "gemini", "moderator"]));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(ids(&sequencer.state()), vec!["KRW-BTC-0"]);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(sequencer.state().displayed.len(), 2);

        sleep(Duration::from_millis(3000)).await;
        let state = sequencer.state();
        assert_eq!(
            ids(&state),
            vec!["KRW-BTC-0", "KRW-BTC-1", "KRW-BTC-2", "KRW-BTC-3"]
        );
        assert!(state.is_complete());
        assert!(!sequencer.is_revealing());

        // k messages, exactly k firings, even long after the last one
        sleep(Duration::from_secs(30)).await;
        assert_eq!(sequencer.inner.read(|i| i.steps), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn new_presentation_replaces_the_old_one() {
        let sequencer = RevealSequencer::default();
        sequencer.present(debate("KRW-ETH", &["a", "b", "c", "d", "e"]));
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(sequencer.state().displayed.len(), 2);

        sequencer.present(debate("KRW-SOL", &["x", "y"]));
        sleep(Duration::from_secs(10)).await;

        let state = sequencer.state();
        assert_eq!(state.ticker.as_deref(), Some("KRW-SOL"));
        assert_eq!(ids(&state), vec!["KRW-SOL-0", "KRW-SOL-1"]);
        assert!(state.pending.is_empty());
        // two firings of the first sequence, two of the second
        assert_eq!(sequencer.inner.read(|i| i.steps), 4);
    }

    #[test]
    fn stale_firings_are_ignored() {
        let inner = Shared::new(RevealInner::default());
        inner.write(|i| {
            i.epoch = 2;
            i.state.pending.push_back(DebateMessage::default());
        });
        assert_eq!(reveal_step(&inner, 1), RevealStep::Stale);
        assert_eq!(reveal_step(&inner, 2), RevealStep::Moved { remaining: 0 });
        assert_eq!(reveal_step(&inner, 2), RevealStep::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_debate_needs_no_timer() {
        let sequencer = RevealSequencer::default();
        sequencer.present(debate("KRW-XRP", &[]));
        assert!(!sequencer.is_revealing());
        assert!(sequencer.state().is_complete());
        assert!(!sequencer.reveal());
    }
}
