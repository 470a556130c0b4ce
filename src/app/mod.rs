mod dashboard;
mod state;

pub use dashboard::{Dashboard, DashboardSettings};
pub use state::{ControlFeedback, DashboardSnapshot, DashboardState};
