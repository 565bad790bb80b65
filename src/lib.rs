#![warn(missing_docs)]
//! RunwayViz - asynchronous video generation against Runway ML.
//!
//! Submits a generation request, polls the remote task until it reaches a
//! terminal state, then downloads the video into a local [`AssetStore`]
//! where it stays addressable until revoked.
//!
//! # Quick Start
//!
//! ```no_run
//! use runwayviz::{GenerationRequest, RunwayProvider, VideoModel, VideoTaskProvider};
//!
//! #[tokio::main]
//! async fn main() -> runwayviz::Result<()> {
//!     let provider = RunwayProvider::from_env()?;
//!     let request = GenerationRequest::new("A cat playing with a ball")
//!         .with_model(VideoModel::HighQuality)
//!         .with_duration(5);
//!
//!     let result = provider.generate(&request).await?;
//!     if let Some(location) = &result.asset_location {
//!         let video = provider.assets().resolve(location).expect("asset is live");
//!         video.save("cat.mp4")?;
//!         provider.assets().revoke(location);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `runway`: Runway ML provider (default)
//! - `video`: All video providers
//! - `cli`: Command-line interface

mod asset;
mod error;
pub mod video;

// Re-export error types at crate root
pub use error::{Result, RunwayVizError};

pub use asset::{Asset, AssetLocation, AssetStore, DEFAULT_VIDEO_MIME};

pub use video::{
    AspectRatio, GenerationRequest, GenerationResult, GenerationTask, PollSchedule, Resolution,
    TaskStatus, VideoModel, VideoProviderKind, VideoTaskProvider,
};

#[cfg(feature = "runway")]
pub use video::providers::{
    estimate_cost, estimate_cost_for_model, RunwayProvider, RunwayProviderBuilder, TimeoutPolicy,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::asset::{AssetLocation, AssetStore};
    pub use crate::error::{Result, RunwayVizError};
    pub use crate::video::{GenerationRequest, GenerationResult, VideoTaskProvider};

    #[cfg(feature = "runway")]
    pub use crate::video::providers::RunwayProvider;
}
