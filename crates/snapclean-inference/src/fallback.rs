//! Deterministic placeholder provider used in demo mode and after live failures.

use std::time::Duration;

use async_trait::async_trait;
use snapclean_models::{DetectedPerson, ImagePayload, ProviderMode};
use tracing::debug;

use crate::config::InferenceConfig;
use crate::error::InferenceResult;
use crate::provider::InferenceProvider;

/// Provider that never fails: three fixed detections, and removal returns the
/// original image unchanged.
#[derive(Debug, Clone, Default)]
pub struct FallbackProvider {
    detect_delay: Duration,
    remove_delay: Duration,
}

impl FallbackProvider {
    pub fn new(detect_delay: Duration, remove_delay: Duration) -> Self {
        Self {
            detect_delay,
            remove_delay,
        }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(config.demo_detect_delay, config.demo_remove_delay)
    }

    /// The fixed placeholder detections.
    pub fn placeholder_people() -> Vec<DetectedPerson> {
        vec![
            DetectedPerson::new("1", 120, 180, 95, 140, 0.94),
            DetectedPerson::new("2", 280, 160, 85, 125, 0.87),
            DetectedPerson::new("3", 450, 200, 75, 115, 0.92),
        ]
    }
}

#[async_trait]
impl InferenceProvider for FallbackProvider {
    fn mode(&self) -> ProviderMode {
        ProviderMode::Demo
    }

    async fn detect(&self, _image: &ImagePayload) -> InferenceResult<Vec<DetectedPerson>> {
        if !self.detect_delay.is_zero() {
            tokio::time::sleep(self.detect_delay).await;
        }
        debug!("Returning placeholder detections");
        Ok(Self::placeholder_people())
    }

    async fn remove(
        &self,
        image: &ImagePayload,
        people: &[DetectedPerson],
    ) -> InferenceResult<ImagePayload> {
        if !self.remove_delay.is_zero() {
            tokio::time::sleep(self.remove_delay).await;
        }
        debug!(selected = people.len(), "Returning original image unchanged");
        Ok(image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_detect_is_deterministic_and_non_empty() {
        let provider = FallbackProvider::default();
        let image = ImagePayload::new("data:image/png;base64,AA==");

        let first = provider.detect(&image).await.unwrap();
        let second = provider.detect(&image).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|p| p.selected && p.is_valid()));
        assert_eq!(
            first.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            ["1", "2", "3"]
        );
    }

    #[tokio::test]
    async fn test_remove_returns_original() {
        let provider = FallbackProvider::default();
        let image = ImagePayload::new("data:image/jpeg;base64,/9j/");
        let out = provider
            .remove(&image, &FallbackProvider::placeholder_people())
            .await
            .unwrap();
        assert_eq!(out, image);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_latency_is_applied() {
        let provider = FallbackProvider::new(Duration::from_millis(1500), Duration::ZERO);
        let start = tokio::time::Instant::now();
        provider.detect(&ImagePayload::new("x")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}
