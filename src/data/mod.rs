mod api;
mod event_channel;
mod http;

pub use api::{ControlAck, DashboardApi};
pub use event_channel::{ChannelEvent, ChannelState, EventChannel, EventHandler};
pub use http::{CredentialSource, HttpApi, NoCredentials, StaticToken};
