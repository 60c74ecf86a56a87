//! Detection and removal clients.
//!
//! Both clients wrap a primary [`InferenceProvider`] and recover from any
//! primary failure by answering with [`FallbackProvider`] data. The returned
//! message always tells the caller which of the two produced the result.

use std::sync::Arc;

use metrics::counter;
use snapclean_models::{DetectedPerson, ImagePayload, ProviderMode};
use tracing::{info, warn};

use crate::config::InferenceConfig;
use crate::error::{InferenceError, InferenceResult};
use crate::fallback::FallbackProvider;
use crate::provider::{provider_from_config, InferenceProvider};

/// Counter of primary provider failures answered with fallback data.
pub const PROVIDER_FALLBACKS_TOTAL: &str = "snapclean_provider_fallbacks_total";

/// Result of a detection request.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub people: Vec<DetectedPerson>,
    pub mode: ProviderMode,
    pub message: String,
}

/// Result of a removal request.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub image: ImagePayload,
    pub mode: ProviderMode,
    pub message: String,
}

fn record_fallback(operation: &'static str, error: &InferenceError) {
    counter!(
        PROVIDER_FALLBACKS_TOTAL,
        "operation" => operation,
        "reason" => error.reason()
    )
    .increment(1);
}

fn people_phrase(n: usize) -> String {
    if n == 1 {
        "1 person".to_string()
    } else {
        format!("{} people", n)
    }
}

/// Finds people through the configured provider.
#[derive(Clone)]
pub struct DetectionClient {
    primary: Arc<dyn InferenceProvider>,
    fallback: FallbackProvider,
}

impl DetectionClient {
    pub fn new(primary: Arc<dyn InferenceProvider>, fallback: FallbackProvider) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(config: &InferenceConfig) -> InferenceResult<Self> {
        Ok(Self::new(
            provider_from_config(config)?,
            FallbackProvider::from_config(config),
        ))
    }

    pub fn mode(&self) -> ProviderMode {
        self.primary.mode()
    }

    pub fn provider(&self) -> &Arc<dyn InferenceProvider> {
        &self.primary
    }

    /// Detect people in `image`.
    ///
    /// Never fails on provider errors; only an error of the fallback itself is
    /// returned.
    pub async fn detect(&self, image: &ImagePayload) -> InferenceResult<Detection> {
        match self.primary.detect(image).await {
            Ok(people) => {
                let mode = self.primary.mode();
                let message = match (mode, people.len()) {
                    (ProviderMode::Live, 0) => "No people detected in the image".to_string(),
                    (ProviderMode::Live, n) => {
                        format!("Detected {} in the image", people_phrase(n))
                    }
                    (ProviderMode::Demo, n) => format!(
                        "Detected {} in the image (demo mode: placeholder detections)",
                        people_phrase(n)
                    ),
                };
                info!(mode = %mode, count = people.len(), "Detection complete");
                Ok(Detection {
                    people,
                    mode,
                    message,
                })
            }
            Err(e) => {
                if e.is_quota() {
                    warn!("Detection provider quota exhausted, using placeholder detections: {}", e);
                } else {
                    warn!("Detection provider failed, using placeholder detections: {}", e);
                }
                record_fallback("detect", &e);

                let people = self.fallback.detect(image).await?;
                let message = format!(
                    "Detected {} in the image (demo mode: detection provider unavailable)",
                    people_phrase(people.len())
                );
                Ok(Detection {
                    people,
                    mode: ProviderMode::Demo,
                    message,
                })
            }
        }
    }
}

/// Erases selected people through the configured provider.
#[derive(Clone)]
pub struct RemovalClient {
    primary: Arc<dyn InferenceProvider>,
    fallback: FallbackProvider,
}

impl RemovalClient {
    pub fn new(primary: Arc<dyn InferenceProvider>, fallback: FallbackProvider) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(config: &InferenceConfig) -> InferenceResult<Self> {
        Ok(Self::new(
            provider_from_config(config)?,
            FallbackProvider::from_config(config),
        ))
    }

    pub fn mode(&self) -> ProviderMode {
        self.primary.mode()
    }

    pub fn provider(&self) -> &Arc<dyn InferenceProvider> {
        &self.primary
    }

    /// Remove `people` from `image`.
    ///
    /// On provider failure the original image is returned unchanged and the
    /// message says so.
    pub async fn remove(
        &self,
        image: &ImagePayload,
        people: &[DetectedPerson],
    ) -> InferenceResult<Removal> {
        if people.is_empty() {
            return Ok(Removal {
                image: image.clone(),
                mode: self.primary.mode(),
                message: "No people selected; the image was returned unchanged".to_string(),
            });
        }

        let n = people_phrase(people.len());
        match self.primary.remove(image, people).await {
            Ok(cleaned) => {
                let mode = self.primary.mode();
                let message = match mode {
                    ProviderMode::Live => format!("Successfully removed {} from the image", n),
                    ProviderMode::Demo => format!(
                        "Demo mode: returned the original image unchanged ({} selected)",
                        n
                    ),
                };
                info!(mode = %mode, count = people.len(), "Removal complete");
                Ok(Removal {
                    image: cleaned,
                    mode,
                    message,
                })
            }
            Err(e) => {
                if e.is_quota() {
                    warn!("Removal provider quota exhausted, returning original image: {}", e);
                } else {
                    warn!("Removal provider failed, returning original image: {}", e);
                }
                record_fallback("remove", &e);

                let image = self.fallback.remove(image, people).await?;
                Ok(Removal {
                    image,
                    mode: ProviderMode::Demo,
                    message: format!(
                        "Removal provider unavailable; demo mode returned the original image unchanged ({} selected)",
                        n
                    ),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    /// Provider that always fails with the given status.
    struct Broken(u16);

    #[async_trait]
    impl InferenceProvider for Broken {
        fn mode(&self) -> ProviderMode {
            ProviderMode::Live
        }

        async fn detect(&self, _image: &ImagePayload) -> InferenceResult<Vec<DetectedPerson>> {
            Err(InferenceError::from_http_status(self.0, "boom"))
        }

        async fn remove(
            &self,
            _image: &ImagePayload,
            _people: &[DetectedPerson],
        ) -> InferenceResult<ImagePayload> {
            Err(InferenceError::from_http_status(self.0, "boom"))
        }
    }

    /// Provider that finds nobody and "cleans" to a fixed URL.
    struct Empty;

    #[async_trait]
    impl InferenceProvider for Empty {
        fn mode(&self) -> ProviderMode {
            ProviderMode::Live
        }

        async fn detect(&self, _image: &ImagePayload) -> InferenceResult<Vec<DetectedPerson>> {
            Ok(Vec::new())
        }

        async fn remove(
            &self,
            _image: &ImagePayload,
            _people: &[DetectedPerson],
        ) -> InferenceResult<ImagePayload> {
            Ok(ImagePayload::new("https://cdn.example.com/clean.png"))
        }
    }

    fn fallback() -> FallbackProvider {
        FallbackProvider::new(Duration::ZERO, Duration::ZERO)
    }

    fn image() -> ImagePayload {
        ImagePayload::new("data:image/png;base64,AA==")
    }

    #[tokio::test]
    async fn test_demo_detection_discloses_demo_mode() {
        let client = DetectionClient::from_config(&InferenceConfig::instant_demo()).unwrap();
        let detection = client.detect(&image()).await.unwrap();
        assert_eq!(detection.mode, ProviderMode::Demo);
        assert_eq!(detection.people.len(), 3);
        assert!(detection.message.starts_with("Detected 3 people"));
        assert!(detection.message.contains("demo mode"));
    }

    #[tokio::test]
    async fn test_failed_detection_falls_back() {
        for status in [429, 500, 400] {
            let client = DetectionClient::new(Arc::new(Broken(status)), fallback());
            let detection = client.detect(&image()).await.unwrap();
            assert_eq!(detection.mode, ProviderMode::Demo);
            assert_eq!(detection.people, FallbackProvider::placeholder_people());
            assert!(detection.message.contains("unavailable"));
        }
    }

    #[tokio::test]
    async fn test_live_empty_detection_is_not_a_failure() {
        let client = DetectionClient::new(Arc::new(Empty), fallback());
        let detection = client.detect(&image()).await.unwrap();
        assert_eq!(detection.mode, ProviderMode::Live);
        assert!(detection.people.is_empty());
        assert_eq!(detection.message, "No people detected in the image");
    }

    #[tokio::test]
    async fn test_failed_removal_returns_original() {
        let client = RemovalClient::new(Arc::new(Broken(503)), fallback());
        let people = FallbackProvider::placeholder_people();
        let removal = client.remove(&image(), &people[..2]).await.unwrap();
        assert_eq!(removal.image, image());
        assert_eq!(removal.mode, ProviderMode::Demo);
        assert!(removal.message.contains("returned the original image unchanged (2 people selected)"));
    }

    #[tokio::test]
    async fn test_live_removal_reports_success() {
        let client = RemovalClient::new(Arc::new(Empty), fallback());
        let people = FallbackProvider::placeholder_people();
        let removal = client.remove(&image(), &people[..1]).await.unwrap();
        assert_eq!(removal.mode, ProviderMode::Live);
        assert_eq!(removal.image.as_str(), "https://cdn.example.com/clean.png");
        assert_eq!(removal.message, "Successfully removed 1 person from the image");
    }

    #[tokio::test]
    async fn test_empty_selection_skips_provider() {
        let client = RemovalClient::new(Arc::new(Broken(500)), fallback());
        let removal = client.remove(&image(), &[]).await.unwrap();
        assert_eq!(removal.image, image());
        assert!(removal.message.starts_with("No people selected"));
    }
}
