//! Error types for video generation.

use std::time::Duration;

/// Maximum length of a provider message surfaced in an error.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while driving a generation task.
#[derive(Debug, thiserror::Error)]
pub enum RunwayVizError {
    /// Credential missing or otherwise unusable. Never retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider answered with a non-2xx status.
    #[error("provider error: {status} - {message}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Provider message, or the HTTP status text when none was given.
        message: String,
    },

    /// Polling exhausted its attempts before the task reached a terminal state.
    #[error("generation timed out after {attempts} polls ({waited:?}), please retry")]
    Timeout {
        /// Number of status polls performed.
        attempts: u32,
        /// Wall-clock time spent polling.
        waited: Duration,
    },

    /// Fetching the generated asset failed.
    #[error("asset download failed: {message}")]
    Download {
        /// HTTP status code, when the server answered.
        status: Option<u16>,
        /// What went wrong.
        message: String,
    },

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider returned a response that does not fit the protocol.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunwayVizError {
    /// Builds the error for a missing credential.
    pub(crate) fn missing_credential() -> Self {
        Self::Configuration("provider credential not configured".into())
    }

    /// Returns true if resubmitting the same request may succeed.
    ///
    /// The client itself never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout { .. } | Self::Network(_) => true,
            Self::Download { status, .. } => status.map_or(true, |s| s >= 500),
            _ => false,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            Self::Download { status, .. } => *status,
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, RunwayVizError>;

/// Trims a provider message and caps its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    truncated.push_str("...");
    truncated
}

/// Extracts the structured message from a provider error body.
///
/// Looks at `error`, then `message`, then `error.message`. Returns `None` when
/// the body is not JSON or carries none of these.
pub(crate) fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = match value.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.as_str()),
        Some(obj) => obj.get("message").and_then(|m| m.as_str()),
        None => None,
    }
    .or_else(|| value.get("message").and_then(|m| m.as_str()))?;

    let message = sanitize_error_message(message);
    (!message.is_empty()).then_some(message)
}

/// Maps a non-2xx provider response to a [`RunwayVizError::Provider`].
pub(crate) fn provider_error(status: reqwest::StatusCode, body: &str) -> RunwayVizError {
    let message = provider_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    });
    RunwayVizError::Provider {
        status: status.as_u16(),
        message,
    }
}
