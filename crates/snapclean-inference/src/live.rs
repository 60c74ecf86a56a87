//! Hosted inference provider HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snapclean_models::{DetectedPerson, ImagePayload, ProviderMode};
use tracing::{debug, warn};
use url::Url;

use crate::config::InferenceConfig;
use crate::error::{InferenceError, InferenceResult};
use crate::provider::InferenceProvider;
use crate::types::{
    normalize_detections, normalize_removal, DetectPayload, DetectionBody, HealthResponse,
    Region, RemovalBody, RemovePayload,
};

/// Client for the hosted detection/removal API.
pub struct LiveProvider {
    http: Client,
    base_url: Url,
    api_token: String,
}

impl LiveProvider {
    /// Create a new live provider.
    pub fn new(base_url: &str, api_token: impl Into<String>, timeout: Duration) -> InferenceResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| InferenceError::NotConfigured(format!("invalid base URL {}: {}", base_url, e)))?;

        // Url::join replaces the last segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InferenceError::Network)?;

        Ok(Self {
            http,
            base_url,
            api_token: api_token.into(),
        })
    }

    /// Create from config; `None` when no credential is configured.
    pub fn from_config(config: &InferenceConfig) -> InferenceResult<Option<Self>> {
        config
            .api_token
            .as_deref()
            .map(|token| Self::new(&config.base_url, token, config.timeout))
            .transpose()
    }

    fn endpoint(&self, path: &str) -> InferenceResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| InferenceError::NotConfigured(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> InferenceResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("Sending inference request to {}", url);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(InferenceError::from_http_status(status.as_u16(), text));
        }

        serde_json::from_str(&text).map_err(|e| {
            InferenceError::InvalidResponse(format!("could not decode {} response: {}", path, e))
        })
    }
}

#[async_trait]
impl InferenceProvider for LiveProvider {
    fn mode(&self) -> ProviderMode {
        ProviderMode::Live
    }

    async fn detect(&self, image: &ImagePayload) -> InferenceResult<Vec<DetectedPerson>> {
        let body: DetectionBody = self.post("v1/detect", &DetectPayload { image }).await?;
        Ok(normalize_detections(body))
    }

    async fn remove(
        &self,
        image: &ImagePayload,
        people: &[DetectedPerson],
    ) -> InferenceResult<ImagePayload> {
        let payload = RemovePayload {
            image,
            regions: people.iter().map(Region::from).collect(),
        };
        let body: RemovalBody = self.post("v1/remove", &payload).await?;
        normalize_removal(body)
    }

    async fn health_check(&self) -> bool {
        let url = match self.endpoint("health") {
            Ok(url) => url,
            Err(_) => return false,
        };

        match self.http.get(url).bearer_auth(&self.api_token).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<HealthResponse>()
                .await
                .map(|h| h.status == "healthy" || h.status == "ok")
                .unwrap_or(false),
            Ok(response) => {
                warn!("Inference provider health check failed: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Inference provider health check error: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> LiveProvider {
        LiveProvider::new(&server.uri(), "test-token", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_from_config_requires_token() {
        assert!(LiveProvider::from_config(&InferenceConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let live = LiveProvider::new("https://infer.example.com/api", "t", Duration::from_secs(1)).unwrap();
        assert_eq!(
            live.endpoint("v1/detect").unwrap().as_str(),
            "https://infer.example.com/api/v1/detect"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            LiveProvider::new("not a url", "t", Duration::from_secs(1)),
            Err(InferenceError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_detect_sends_token_and_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/detect"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({"image": "data:image/png;base64,AA=="})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [
                    {"x1": 10, "y1": 20, "x2": 60, "y2": 120, "score": 0.9, "class": "person"},
                    {"x1": 0, "y1": 0, "x2": 5, "y2": 5, "score": 0.9, "class": "cat"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let people = provider(&server)
            .detect(&ImagePayload::new("data:image/png;base64,AA=="))
            .await
            .unwrap();
        assert_eq!(people, vec![DetectedPerson::new("1", 10, 20, 50, 100, 0.9)]);
    }

    #[tokio::test]
    async fn test_quota_response_maps_to_quota_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/detect"))
            .respond_with(ResponseTemplate::new(429).set_body_string("monthly quota exceeded"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .detect(&ImagePayload::new("x"))
            .await
            .unwrap_err();
        assert!(err.is_quota());
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/remove"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .remove(&ImagePayload::new("x"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_remove_sends_regions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/remove"))
            .and(body_partial_json(serde_json::json!({
                "regions": [{"x": 120, "y": 180, "width": 95, "height": 140}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"output": "https://cdn.example.com/clean.png"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let person = DetectedPerson::new("1", 120, 180, 95, 140, 0.94);
        let cleaned = provider(&server)
            .remove(&ImagePayload::new("x"), &[person])
            .await
            .unwrap();
        assert_eq!(cleaned.as_str(), "https://cdn.example.com/clean.png");
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .mount(&server)
            .await;

        assert!(provider(&server).health_check().await);
    }
}
