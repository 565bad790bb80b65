//! Video generation module.

pub mod poll;
mod provider;
pub mod providers;
mod types;

pub use poll::{poll_with_interval, PollSchedule, PollStep};
pub use provider::VideoTaskProvider;
pub use types::{
    AspectRatio, GenerationRequest, GenerationResult, GenerationTask, Resolution, TaskStatus,
    TaskUpdate, VideoModel, VideoProviderKind, ALLOWED_DURATIONS,
};
