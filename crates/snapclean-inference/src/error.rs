//! Inference provider error types.

use thiserror::Error;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Provider quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Provider unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InferenceError {
    /// Map a non-success HTTP status from the provider.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            402 | 429 => Self::QuotaExceeded(format!("{}: {}", status, body)),
            500..=599 => Self::ServiceUnavailable(format!("{}: {}", status, body)),
            _ => Self::RequestFailed(format!("{}: {}", status, body)),
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, InferenceError::QuotaExceeded(_))
    }

    /// Short label used for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            InferenceError::QuotaExceeded(_) => "quota",
            InferenceError::ServiceUnavailable(_) => "unavailable",
            InferenceError::RequestFailed(_) => "request_failed",
            InferenceError::InvalidResponse(_) | InferenceError::Json(_) => "invalid_response",
            InferenceError::NotConfigured(_) => "not_configured",
            InferenceError::Network(_) => "network",
        }
    }
}
