//! Configuration module for the dashboard sync layer.

// Can all be private because we have a public re-export.
mod api;
mod automation;
mod debug;
mod logs;
mod schedule;

pub use api::{API, ApiConfig};
pub use automation::{
    AutomationConfig, BuyScanParams, ConfigureRequest, SellScanParams, StrategyId, UnlimitedFlags,
};
pub use debug::DF;
pub use logs::{LOGS, LogCapacities};
pub use schedule::{SCHEDULE, ScheduleConfig};
