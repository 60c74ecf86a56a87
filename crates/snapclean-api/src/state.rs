//! Application state.

use snapclean_inference::{
    provider_from_config, DetectionClient, FallbackProvider, InferenceConfig, InferenceProvider,
    InferenceResult, RemovalClient,
};
use snapclean_models::ProviderMode;
use std::sync::Arc;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub detection: DetectionClient,
    pub removal: RemovalClient,
}

impl AppState {
    /// Create new application state; the provider is chosen from `inference`.
    pub fn new(config: ApiConfig, inference: &InferenceConfig) -> InferenceResult<Self> {
        Ok(Self::with_provider(
            config,
            provider_from_config(inference)?,
            FallbackProvider::from_config(inference),
        ))
    }

    /// Create state around an explicit primary provider.
    pub fn with_provider(
        config: ApiConfig,
        provider: Arc<dyn InferenceProvider>,
        fallback: FallbackProvider,
    ) -> Self {
        Self {
            config,
            detection: DetectionClient::new(Arc::clone(&provider), fallback.clone()),
            removal: RemovalClient::new(provider, fallback),
        }
    }

    pub fn mode(&self) -> ProviderMode {
        self.detection.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_share_one_provider() {
        let state = AppState::new(ApiConfig::default(), &InferenceConfig::instant_demo()).unwrap();
        assert!(Arc::ptr_eq(state.detection.provider(), state.removal.provider()));
        assert_eq!(state.mode(), ProviderMode::Demo);
    }
}
