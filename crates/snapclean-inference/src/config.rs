//! Inference provider configuration.

use std::time::Duration;

/// Configuration for the detection and removal clients.
///
/// The presence of `api_token` is the single switch between the live provider
/// and demo mode.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Bearer token for the hosted provider
    pub api_token: Option<String>,
    /// Base URL of the hosted provider
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Artificial latency of demo detection
    pub demo_detect_delay: Duration,
    /// Artificial latency of demo removal
    pub demo_remove_delay: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(120),
            demo_detect_delay: Duration::from_millis(1500),
            demo_remove_delay: Duration::from_millis(3000),
        }
    }
}

impl InferenceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_token: std::env::var("INFERENCE_API_TOKEN")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            base_url: std::env::var("INFERENCE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("INFERENCE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            demo_detect_delay: Duration::from_millis(
                std::env::var("DEMO_DETECT_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1500),
            ),
            demo_remove_delay: Duration::from_millis(
                std::env::var("DEMO_REMOVE_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
            ),
        }
    }

    /// Whether a live provider credential is present.
    pub fn is_live(&self) -> bool {
        self.api_token.is_some()
    }

    /// Demo mode without artificial latency.
    pub fn instant_demo() -> Self {
        Self {
            demo_detect_delay: Duration::ZERO,
            demo_remove_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
