use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::SCHEDULE;
use crate::error::Result;
use crate::models::{Balance, Signal};
use crate::shared::{Shared, TaskHandle};
use crate::utils::now_utc;

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    pub connected: bool,
    pub last_event_at: Option<DateTime<Utc>>,
    pub reconnects: u64,
}

/// A decoded push from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Full replacement of the wallet lines.
    Balances(Vec<Balance>),
    /// An automated trade executed; carries no payload we rely on.
    Trade,
    Signal(Signal),
    AutomationStarted,
    AutomationStopped,
    /// `pong`, `status`, `prices` or a kind we don't know yet.
    Ignored(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl ChannelEvent {
    pub fn decode(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let event = match envelope.kind.as_str() {
            "balances" => ChannelEvent::Balances(serde_json::from_value(envelope.data)?),
            "trade" | "ai_scalping_trade" => ChannelEvent::Trade,
            "signal" => ChannelEvent::Signal(serde_json::from_value(envelope.data)?),
            "ai_scalping_started" => ChannelEvent::AutomationStarted,
            "ai_scalping_stopped" => ChannelEvent::AutomationStopped,
            _ => ChannelEvent::Ignored(envelope.kind),
        };
        Ok(event)
    }
}

pub type EventHandler = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

/// Push channel to the trading server with automatic reconnection.
///
/// The connection is re-opened after a fixed delay for as long as the
/// channel is active; only `shutdown()` ends it.
pub struct EventChannel {
    url: String,
    reconnect_delay: Duration,
    state: Shared<ChannelState>,
    handler: EventHandler,
    task: Shared<Option<TaskHandle>>,
}

impl EventChannel {
    pub fn new(url: impl Into<String>, handler: EventHandler) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: SCHEDULE.reconnect_delay,
            state: Shared::default(),
            handler,
            task: Shared::new(None),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn state(&self) -> ChannelState {
        self.state.snapshot()
    }

    pub fn is_active(&self) -> bool {
        self.task
            .read(|task| task.as_ref().is_some_and(|t| !t.is_finished()))
    }

    /// Open the channel. No-op while a connection task is already alive.
    pub fn connect(&self) {
        self.task.write(|task| {
            if task.as_ref().is_some_and(|t| !t.is_finished()) {
                return;
            }
            let url = self.url.clone();
            let delay = self.reconnect_delay;
            let state = self.state.clone();
            let handler = self.handler.clone();
            *task = Some(TaskHandle::spawn(run_with_reconnect(
                url, delay, state, handler,
            )));
        });
    }

    /// Close the socket and cancel any pending reconnect. Idempotent.
    pub fn shutdown(&self) {
        if let Some(task) = self.task.write(Option::take) {
            task.cancel();
            #[cfg(debug_assertions)]
            if DF.log_channel_events {
                log::info!("Event channel shut down");
            }
        }
        self.state.write(|s| s.connected = false);
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_with_reconnect(
    url: String,
    delay: Duration,
    state: Shared<ChannelState>,
    handler: EventHandler,
) {
    loop {
        #[cfg(debug_assertions)]
        if DF.log_channel_events {
            log::info!("Connecting event channel to {}", url);
        }

        match run_session(&url, &state, &handler).await {
            Ok(()) => {
                log::warn!(
                    "Event channel closed. Reconnecting in {}s...",
                    delay.as_secs_f64()
                );
            }
            Err(e) => {
                log::error!(
                    "Event channel failed: {}. Retrying in {}s...",
                    e,
                    delay.as_secs_f64()
                );
            }
        }

        state.write(|s| s.connected = false);
        sleep(delay).await;
        state.write(|s| s.reconnects += 1);
    }
}

async fn run_session(url: &str, state: &Shared<ChannelState>, handler: &EventHandler) -> Result<()> {
    let (mut ws_stream, _) = connect_async(url).await?;
    state.write(|s| s.connected = true);

    while let Some(msg) = ws_stream.next().await {
        match msg? {
            Message::Text(text) => match ChannelEvent::decode(text.as_str()) {
                Ok(event) => {
                    state.write(|s| s.last_event_at = Some(now_utc()));
                    #[cfg(debug_assertions)]
                    if DF.log_channel_events {
                        if let ChannelEvent::Ignored(kind) = &event {
                            log::debug!("[channel] ignoring '{}'", kind);
                        } else {
                            log::info!("[channel] {:?}", event);
                        }
                    }
                    handler(event);
                }
                Err(e) => log::warn!("⚠️ Failed to decode channel message: {}", e),
            },
            Message::Close(_) => break,
            // tungstenite queues the pong reply itself
            _ => {}
        }
    }

    Ok(())
}
