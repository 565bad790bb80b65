//! Runway ML video generation provider (text-to-video and image-to-video).

use crate::asset::{AssetStore, DEFAULT_VIDEO_MIME};
use crate::error::{provider_error, Result, RunwayVizError};
use crate::video::poll::{poll_with_interval, PollSchedule, PollStep};
use crate::video::provider::VideoTaskProvider;
use crate::video::types::{
    GenerationRequest, GenerationResult, GenerationTask, TaskStatus, TaskUpdate, VideoModel,
    VideoProviderKind, DEFAULT_FAILURE_MESSAGE,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const BASE_URL: &str = "https://api.dev.runwayml.com/v1";
const API_VERSION: &str = "2024-11-06";
const API_VERSION_HEADER: &str = "X-Runway-Version";
const API_KEY_ENV: &str = "RUNWAYML_API_SECRET";

/// Dollars per Runway credit.
pub const DOLLARS_PER_CREDIT: f64 = 0.01;

/// Estimated price of a request in dollars.
pub fn estimate_cost(request: &GenerationRequest) -> f64 {
    cost_for(request.model, request.duration_secs)
}

/// Estimated price for a model given by name. Unknown names are priced as
/// [`VideoModel::Fast`].
pub fn estimate_cost_for_model(model: &str, duration_secs: u32) -> f64 {
    cost_for(model.parse().unwrap_or_default(), duration_secs)
}

fn cost_for(model: VideoModel, duration_secs: u32) -> f64 {
    model.credits_per_second() * f64::from(duration_secs) * DOLLARS_PER_CREDIT
}

/// What to do with the remote task when polling gives up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Leave the task running on the provider.
    #[default]
    LeaveRunning,
    /// Send a best-effort cancellation before reporting the timeout.
    Cancel,
}

/// Builder for RunwayProvider.
#[derive(Debug, Clone)]
pub struct RunwayProviderBuilder {
    api_key: Option<String>,
    api_key_env: String,
    base_url: String,
    api_version: String,
    poll_interval: Duration,
    max_attempts: u32,
    on_timeout: TimeoutPolicy,
    client: Option<reqwest::Client>,
    assets: Option<AssetStore>,
}

impl Default for RunwayProviderBuilder {
    fn default() -> Self {
        let schedule = PollSchedule::default();
        Self {
            api_key: None,
            api_key_env: API_KEY_ENV.into(),
            base_url: BASE_URL.into(),
            api_version: API_VERSION.into(),
            poll_interval: schedule.interval,
            max_attempts: schedule.max_attempts,
            on_timeout: TimeoutPolicy::default(),
            client: None,
            assets: None,
        }
    }
}

impl RunwayProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `RUNWAYML_API_SECRET` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Changes the environment variable the API key is read from.
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the `X-Runway-Version` header value.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the polling interval for async generation.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum number of status polls.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets what happens to the remote task when polling times out.
    pub fn on_timeout(mut self, policy: TimeoutPolicy) -> Self {
        self.on_timeout = policy;
        self
    }

    /// Uses a preconfigured HTTP client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Registers downloads in a shared asset store.
    pub fn asset_store(mut self, store: AssetStore) -> Self {
        self.assets = Some(store);
        self
    }

    /// Builds the provider.
    ///
    /// A missing API key is not an error here: every call that needs it fails
    /// with [`RunwayVizError::Configuration`] before touching the network.
    pub fn build(self) -> Result<RunwayProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::debug!(env = %self.api_key_env, "no Runway API key configured");
        }

        let base_url = self.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            RunwayVizError::InvalidRequest(format!("invalid base URL {base_url:?}: {e}"))
        })?;

        Ok(RunwayProvider {
            client: self.client.unwrap_or_default(),
            api_key,
            base_url,
            api_version: self.api_version,
            schedule: PollSchedule::new(self.poll_interval, self.max_attempts),
            on_timeout: self.on_timeout,
            assets: self.assets.unwrap_or_default(),
        })
    }
}

/// Runway ML video generation provider.
pub struct RunwayProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    api_version: String,
    schedule: PollSchedule,
    on_timeout: TimeoutPolicy,
    assets: AssetStore,
}

impl RunwayProvider {
    /// Creates a new `RunwayProviderBuilder`.
    pub fn builder() -> RunwayProviderBuilder {
        RunwayProviderBuilder::new()
    }

    /// Builds a provider with default settings and the key from the environment.
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// Returns true if an API key is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// The store downloads are registered in.
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// The polling schedule in use.
    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    fn credential(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(RunwayVizError::missing_credential)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let key = self.credential()?;
        Ok(builder
            .header("Authorization", format!("Bearer {}", key))
            .header(API_VERSION_HEADER, &self.api_version))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(provider_error(status, &text))
    }

    /// Fetches the current state of a task with a single status poll.
    pub async fn task_status(&self, task_id: &str) -> Result<GenerationTask> {
        let mut task = GenerationTask::new(task_id);
        task.observe(self.fetch_update(task_id).await?);
        Ok(task)
    }

    async fn fetch_update(&self, task_id: &str) -> Result<TaskUpdate> {
        let url = format!("{}/tasks/{}", self.base_url, task_id);
        let response = self.authorized(self.client.get(&url))?.send().await?;
        let response = Self::check(response).await?;
        let body: RunwayTaskResponse = response.json().await?;
        Ok(body.into_update())
    }

    /// Downloads an asset, returning its bytes and MIME type.
    async fn fetch_asset(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RunwayVizError::Download {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RunwayVizError::Download {
                status: Some(status.as_u16()),
                message: format!("{} returned {}", url, status),
            });
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_VIDEO_MIME.to_string());

        let data = response
            .bytes()
            .await
            .map_err(|e| RunwayVizError::Download {
                status: Some(status.as_u16()),
                message: format!("failed to read body: {e}"),
            })?;

        Ok((data.to_vec(), mime_type))
    }

    async fn cancel_after_timeout(&self, task_id: &str) {
        if self.on_timeout != TimeoutPolicy::Cancel {
            return;
        }
        match self.cancel(task_id).await {
            Ok(()) => tracing::debug!(task_id = %task_id, "cancelled timed-out task"),
            Err(e) => tracing::warn!(task_id = %task_id, "failed to cancel timed-out task: {e}"),
        }
    }
}

#[async_trait]
impl VideoTaskProvider for RunwayProvider {
    async fn submit(&self, request: &GenerationRequest) -> Result<String> {
        self.credential()?;
        request.validate()?;

        let body = RunwayTaskRequest::from_request(request);
        let url = format!("{}/image_to_video", self.base_url);

        let response = self
            .authorized(self.client.post(&url))?
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let submit_response: RunwaySubmitResponse = response.json().await?;
        if submit_response.id.is_empty() {
            return Err(RunwayVizError::UnexpectedResponse(
                "Runway returned an empty task id".into(),
            ));
        }

        tracing::debug!(
            task_id = %submit_response.id,
            model = body.model,
            duration = body.duration,
            image_to_video = body.prompt_image.is_some(),
            "submitted Runway task"
        );
        Ok(submit_response.id)
    }

    async fn await_completion(&self, task_id: &str) -> Result<GenerationResult> {
        self.credential()?;

        let task = Mutex::new(GenerationTask::new(task_id));
        let outcome = poll_with_interval(self.schedule, |attempt| {
            let task = &task;
            async move {
                let update = self.fetch_update(task_id).await?;
                let mut task = task.lock().unwrap_or_else(PoisonError::into_inner);
                task.observe(update);
                tracing::debug!(
                    task_id = %task_id,
                    attempt,
                    status = %task.status,
                    "polling Runway video generation"
                );
                Ok(if task.is_terminal() {
                    PollStep::Ready(task.clone())
                } else {
                    PollStep::Pending
                })
            }
        })
        .await;

        let task = match outcome {
            Ok(task) => task,
            Err(e @ RunwayVizError::Timeout { .. }) => {
                self.cancel_after_timeout(task_id).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        match task.status {
            TaskStatus::Completed => {
                let url = task.output.first().ok_or_else(|| {
                    RunwayVizError::UnexpectedResponse(
                        "Runway returned SUCCEEDED but no output".into(),
                    )
                })?;
                tracing::debug!(url = %url, "Runway video generation complete");

                let (data, mime_type) = self.fetch_asset(url).await?;
                let location = self.assets.register(data, mime_type);
                Ok(GenerationResult::completed(
                    task.task_id,
                    location,
                    task.duration_secs,
                ))
            }
            TaskStatus::Failed => {
                let message = task
                    .failure
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.into());
                tracing::debug!(task_id = %task_id, reason = %message, "Runway task failed");
                Ok(GenerationResult::failed(task.task_id, message))
            }
            other => Err(RunwayVizError::UnexpectedResponse(format!(
                "polling stopped on non-terminal status {other}"
            ))),
        }
    }

    async fn cancel(&self, task_id: &str) -> Result<()> {
        let url = format!("{}/tasks/{}/cancel", self.base_url, task_id);
        let response = self.authorized(self.client.post(&url))?.send().await?;
        Self::check(response).await?;
        tracing::debug!(task_id = %task_id, "cancellation requested");
        Ok(())
    }

    async fn download_asset(&self, url: &str) -> Result<Vec<u8>> {
        let (data, _) = self.fetch_asset(url).await?;
        Ok(data)
    }

    fn estimate_cost(&self, request: &GenerationRequest) -> f64 {
        estimate_cost(request)
    }

    fn kind(&self) -> VideoProviderKind {
        VideoProviderKind::Runway
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/organization", self.base_url);
        let response = self.authorized(self.client.get(&url))?.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
struct RunwayTaskRequest<'a> {
    model: &'static str,
    prompt_text: &'a str,
    duration: u32,
    ratio: &'static str,
    resolution: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
}

impl<'a> RunwayTaskRequest<'a> {
    fn from_request(req: &'a GenerationRequest) -> Self {
        Self {
            model: req.model.as_str(),
            prompt_text: &req.prompt,
            duration: req.duration_secs,
            ratio: req.aspect_ratio.as_str(),
            resolution: req.resolution.as_str(),
            prompt_image: req.source_image.as_deref(),
            seed: req.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunwaySubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunwayTaskResponse {
    status: String,
    #[serde(default)]
    output: Option<Vec<String>>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    failure: Option<String>,
}

impl RunwayTaskResponse {
    fn into_update(self) -> TaskUpdate {
        let status = match self.status.as_str() {
            "PENDING" | "THROTTLED" => Some(TaskStatus::Pending),
            "RUNNING" => Some(TaskStatus::Processing),
            "SUCCEEDED" => Some(TaskStatus::Completed),
            "FAILED" | "CANCELLED" => Some(TaskStatus::Failed),
            _ => None,
        };
        let failure = match (self.status.as_str(), self.failure) {
            ("CANCELLED", None) => Some("task was cancelled".to_string()),
            (_, failure) => failure,
        };
        TaskUpdate {
            status,
            output: self.output.unwrap_or_default(),
            duration_secs: self.duration,
            failure,
        }
    }
}
