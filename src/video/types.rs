//! Core types for video generation.

use crate::asset::AssetLocation;
use crate::error::{Result, RunwayVizError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Durations, in seconds, the provider accepts.
pub const ALLOWED_DURATIONS: [u32; 2] = [5, 10];

/// Message used when a failed task carries no reason.
pub(crate) const DEFAULT_FAILURE_MESSAGE: &str = "video generation failed";

/// Video provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoProviderKind {
    /// Runway ML.
    Runway,
}

impl std::fmt::Display for VideoProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Runway => write!(f, "runway"),
        }
    }
}

/// Generation model tier. Selects the provider backend and the cost rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoModel {
    /// Fastest and cheapest tier.
    #[default]
    Fast,
    /// Higher fidelity output.
    HighQuality,
    /// Most expressive backend.
    Creative,
}

impl VideoModel {
    /// All model tiers.
    pub const ALL: [VideoModel; 3] = [Self::Fast, Self::HighQuality, Self::Creative];

    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "gen3a_turbo",
            Self::HighQuality => "gen4_turbo",
            Self::Creative => "gen4_aleph",
        }
    }

    /// Returns the short name used on the command line.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::HighQuality => "high-quality",
            Self::Creative => "creative",
        }
    }

    /// Credits charged per second of generated video.
    pub fn credits_per_second(&self) -> f64 {
        match self {
            Self::Fast => 5.0,
            Self::HighQuality => 10.0,
            Self::Creative => 15.0,
        }
    }
}

impl FromStr for VideoModel {
    type Err = RunwayVizError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == needle || m.short_name() == needle)
            .ok_or_else(|| RunwayVizError::InvalidRequest(format!("unknown model: {s}")))
    }
}

impl std::fmt::Display for VideoModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape (widescreen) aspect ratio.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait (tall) aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1 square aspect ratio.
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// Returns the ratio as sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Square => "1:1",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = RunwayVizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            "1:1" => Ok(Self::Square),
            other => Err(RunwayVizError::InvalidRequest(format!(
                "unsupported aspect ratio: {other}"
            ))),
        }
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// 1280x720.
    #[default]
    #[serde(rename = "720p")]
    Hd,
    /// 1920x1080.
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    /// Returns the resolution as sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd => "720p",
            Self::FullHd => "1080p",
        }
    }
}

impl FromStr for Resolution {
    type Err = RunwayVizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "720p" => Ok(Self::Hd),
            "1080p" => Ok(Self::FullHd),
            other => Err(RunwayVizError::InvalidRequest(format!(
                "unsupported resolution: {other}"
            ))),
        }
    }
}

/// A request to generate a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired video.
    pub prompt: String,
    /// Source image URI. When set, the provider animates this image.
    pub source_image: Option<String>,
    /// Model tier.
    pub model: VideoModel,
    /// Video duration in seconds (5 or 10).
    pub duration_secs: u32,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Output resolution.
    pub resolution: Resolution,
    /// Seed for reproducible output.
    pub seed: Option<u32>,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt and default settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source_image: None,
            model: VideoModel::default(),
            duration_secs: ALLOWED_DURATIONS[0],
            aspect_ratio: AspectRatio::default(),
            resolution: Resolution::default(),
            seed: None,
        }
    }

    /// Sets a source image for image-to-video generation.
    pub fn with_source_image(mut self, uri: impl Into<String>) -> Self {
        self.source_image = Some(uri.into());
        self
    }

    /// Sets the model tier.
    pub fn with_model(mut self, model: VideoModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the desired video duration in seconds.
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Sets the resolution.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the request before it is sent.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(RunwayVizError::InvalidRequest(
                "prompt must not be empty".into(),
            ));
        }
        if !ALLOWED_DURATIONS.contains(&self.duration_secs) {
            return Err(RunwayVizError::InvalidRequest(format!(
                "duration must be one of {:?} seconds, got {}",
                ALLOWED_DURATIONS, self.duration_secs
            )));
        }
        if let Some(image) = &self.source_image {
            if image.trim().is_empty() {
                return Err(RunwayVizError::InvalidRequest(
                    "source image must not be empty when provided".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Lifecycle state of a generation task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted, not yet started.
    #[default]
    Pending,
    /// Running on the provider.
    Processing,
    /// Finished with output.
    Completed,
    /// Finished without output.
    Failed,
}

impl TaskStatus {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Completed | Self::Failed => 2,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// One observation of a task, as reported by a status poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    /// Mapped status, or `None` when the provider reported something unknown.
    pub status: Option<TaskStatus>,
    /// Output URLs.
    pub output: Vec<String>,
    /// Reported video duration in seconds.
    pub duration_secs: Option<f64>,
    /// Failure reason.
    pub failure: Option<String>,
}

/// Mutable lifecycle record of a provider task.
///
/// Moves `Pending -> Processing -> Completed | Failed`. Once terminal, further
/// observations are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Provider-assigned identifier.
    pub task_id: String,
    /// Current state.
    pub status: TaskStatus,
    /// Output URLs, set on completion.
    pub output: Vec<String>,
    /// Reported duration, set on completion.
    pub duration_secs: Option<f64>,
    /// Failure reason, set on failure.
    pub failure: Option<String>,
    /// Number of observations applied.
    pub polls: u32,
}

impl GenerationTask {
    /// Creates a freshly submitted task.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            output: Vec::new(),
            duration_secs: None,
            failure: None,
            polls: 0,
        }
    }

    /// Returns true once the task can no longer change.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a poll observation. Returns true if the status changed.
    ///
    /// A terminal task is left untouched. Unknown statuses and backwards moves
    /// (e.g. `Processing` back to `Pending`) only count the poll.
    pub fn observe(&mut self, update: TaskUpdate) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.polls += 1;

        let Some(next) = update.status else {
            return false;
        };
        if next.rank() < self.status.rank() || next == self.status {
            return false;
        }

        match next {
            TaskStatus::Completed => {
                self.output = update.output;
                self.duration_secs = update.duration_secs;
            }
            TaskStatus::Failed => {
                self.failure = Some(
                    update
                        .failure
                        .filter(|f| !f.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.into()),
                );
            }
            TaskStatus::Pending | TaskStatus::Processing => {}
        }
        self.status = next;
        true
    }
}

/// Terminal outcome of a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Provider-assigned identifier.
    pub task_id: String,
    /// `Completed` or `Failed`.
    pub status: TaskStatus,
    /// Where the downloaded video lives, on success.
    pub asset_location: Option<AssetLocation>,
    /// Video duration in seconds, on success.
    pub duration_secs: Option<f64>,
    /// Failure reason, on failure.
    pub error_message: Option<String>,
}

impl GenerationResult {
    /// A successful result.
    pub fn completed(
        task_id: impl Into<String>,
        asset_location: AssetLocation,
        duration_secs: Option<f64>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            asset_location: Some(asset_location),
            duration_secs,
            error_message: None,
        }
    }

    /// A failed result.
    pub fn failed(task_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            asset_location: None,
            duration_secs: None,
            error_message: Some(error_message.into()),
        }
    }

    /// Returns true if the task completed with an asset.
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}
