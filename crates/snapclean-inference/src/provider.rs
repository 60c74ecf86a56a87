//! Inference provider abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use snapclean_models::{DetectedPerson, ImagePayload, ProviderMode};
use tracing::info;

use crate::config::InferenceConfig;
use crate::error::InferenceResult;
use crate::fallback::FallbackProvider;
use crate::live::LiveProvider;

/// A backend able to detect people and erase them.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Whether results come from a real provider or placeholder data.
    fn mode(&self) -> ProviderMode;

    /// Locate people in the image.
    async fn detect(&self, image: &ImagePayload) -> InferenceResult<Vec<DetectedPerson>>;

    /// Produce a copy of the image with the given people erased.
    async fn remove(
        &self,
        image: &ImagePayload,
        people: &[DetectedPerson],
    ) -> InferenceResult<ImagePayload>;

    /// Whether the provider is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Select the primary provider: live when a credential is configured,
/// placeholder data otherwise.
pub fn provider_from_config(config: &InferenceConfig) -> InferenceResult<Arc<dyn InferenceProvider>> {
    match LiveProvider::from_config(config)? {
        Some(live) => {
            info!("Inference provider: live ({})", config.base_url);
            Ok(Arc::new(live))
        }
        None => {
            info!("Inference provider: demo (INFERENCE_API_TOKEN not set)");
            Ok(Arc::new(FallbackProvider::from_config(config)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_token_selects_demo() {
        let provider = provider_from_config(&InferenceConfig::instant_demo()).unwrap();
        assert_eq!(provider.mode(), ProviderMode::Demo);
    }

    #[test]
    fn test_token_selects_live() {
        let config = InferenceConfig {
            api_token: Some("secret".to_string()),
            ..InferenceConfig::default()
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.mode(), ProviderMode::Live);
    }
}
