mod shared_state;
mod task_handle;

pub use shared_state::Shared;
pub use task_handle::TaskHandle;
