//! Schedulers: poll loops, exclusive scan cycles, the reveal sequencer and
//! the thought feed. Everything here is driven by `timer::repeat`.

mod poll_loop;
mod reveal;
mod scan_cycle;
mod thought_feed;
mod timer;

pub use poll_loop::{
    ErrorHook, FetchFn, MergeFn, MergeOrder, PollKind, PollLoop, PollOptions, PollStats,
};
pub use reveal::{RevealSequencer, RevealState};
pub use scan_cycle::{
    CycleOptions, LogSink, RefreshHook, RunReport, ScanAction, ScanCycle, ScanCycleState,
};
pub use thought_feed::{ThoughtFeed, ThoughtFeedState, ThoughtSink};
pub use timer::{FirstTick, repeat};
