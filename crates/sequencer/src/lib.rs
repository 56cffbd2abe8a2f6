//! Timed scene sequencer: a segment-granular timeline controller.

pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod side_channel;
pub mod time;
pub mod timeline;

pub use api::{Command, Event, Phase, Sequencer, SequencerSettings, Snapshot};
pub use config::{ProgramConfig, SegmentConfig};
pub use error::{EngineError, InvalidTimelineReason, Result, SideChannelError};
pub use scheduler::{Clock, ManualClock, RunId, Scheduler, SystemClock, TimerQueue};
pub use side_channel::{
    SideChannel, SideChannelFailure, SideChannelOperation, SilentSideChannel,
};
pub use time::{
    TICKS_PER_SECOND, duration_to_ticks, seconds_to_ticks, ticks_to_duration, ticks_to_seconds,
};
pub use timeline::{Segment, SegmentId, SegmentInput, Timeline};
