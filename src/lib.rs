#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod app;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod models;
mod shared;
pub mod utils;

#[cfg(test)]
mod testing;

pub use app::{Dashboard, DashboardSettings, DashboardSnapshot, DashboardState};
pub use error::{Result, SyncError};

// CLI argument parsing
use std::time::Duration;

use clap::Parser;

use crate::config::{API, SCHEDULE};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the trading server's REST API
    #[arg(long, default_value_t = API.base_url.to_string())]
    pub api_base: String,

    /// Push channel endpoint
    #[arg(long, default_value_t = API.ws_url.to_string())]
    pub ws_url: String,

    /// Poll interval for balances, trades, status, prices and positions
    #[arg(long, default_value_t = SCHEDULE.poll_interval.as_secs())]
    pub refresh_secs: u64,

    /// Run the buy scan every minute
    #[arg(long, default_value_t = false)]
    pub auto_buy: bool,

    /// Run the sell scan every minute
    #[arg(long, default_value_t = false)]
    pub auto_sell: bool,

    /// Bearer token for the trading server's API
    #[arg(long)]
    pub api_token: Option<String>,

    /// Feed quick-analysis thoughts into the buy/sell panels
    #[arg(long, default_value_t = false)]
    pub thoughts: bool,
}

impl Cli {
    pub fn settings(&self) -> DashboardSettings {
        DashboardSettings {
            api_base: self.api_base.clone(),
            ws_url: self.ws_url.clone(),
            // zero would spin the poll loops
            poll_interval: Duration::from_secs(self.refresh_secs.max(1)),
            api_token: self.api_token.clone(),
        }
    }
}
