//! Video task provider trait.

use crate::error::Result;
use crate::video::types::{GenerationRequest, GenerationResult, VideoProviderKind};
use async_trait::async_trait;
use std::time::Instant;

/// A provider that runs video generation as a remote asynchronous task.
///
/// Implementations are stateless between calls: the task record lives on the
/// provider side and in whatever the caller keeps from the returned values.
#[async_trait]
pub trait VideoTaskProvider: Send + Sync {
    /// Submits a generation request and returns the provider task id.
    async fn submit(&self, request: &GenerationRequest) -> Result<String>;

    /// Polls the task until it completes, fails, or the attempt cap is hit.
    async fn await_completion(&self, task_id: &str) -> Result<GenerationResult>;

    /// Asks the provider to stop a task.
    async fn cancel(&self, task_id: &str) -> Result<()>;

    /// Fetches a generated asset.
    async fn download_asset(&self, url: &str) -> Result<Vec<u8>>;

    /// Estimated price of the request in dollars.
    fn estimate_cost(&self, request: &GenerationRequest) -> f64;

    /// Returns the kind of this provider.
    fn kind(&self) -> VideoProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.kind() {
            VideoProviderKind::Runway => "Runway ML",
        }
    }

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;

    /// Submits the request and waits for its terminal result.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let start = Instant::now();

        let task_id = self.submit(request).await?;
        tracing::debug!(task_id = %task_id, provider = %self.kind(), "submitted video generation request");

        let mut result = self.await_completion(&task_id).await?;
        if result.is_success() && result.duration_secs.is_none() {
            result.duration_secs = Some(f64::from(request.duration_secs));
        }

        tracing::debug!(
            task_id = %task_id,
            status = %result.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "video generation finished"
        );
        Ok(result)
    }
}
