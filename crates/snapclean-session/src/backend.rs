//! Backend the session talks to for detection and removal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snapclean_models::{
    DetectRequest, DetectResponse, DetectedPerson, ErrorResponse, ImagePayload, ProcessRequest,
    ProcessResponse, ProviderMode,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// People found in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub people: Vec<DetectedPerson>,
    pub message: String,
    pub mode: ProviderMode,
}

impl From<DetectResponse> for DetectionOutcome {
    fn from(r: DetectResponse) -> Self {
        Self {
            people: r.detections,
            message: r.message,
            mode: r.mode,
        }
    }
}

/// Cleaned image.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalOutcome {
    pub image: ImagePayload,
    pub message: String,
    pub mode: ProviderMode,
}

impl From<ProcessResponse> for RemovalOutcome {
    fn from(r: ProcessResponse) -> Self {
        Self {
            image: r.cleaned_image,
            message: r.message,
            mode: r.mode,
        }
    }
}

/// Detection and removal collaborator of an editing session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EditingBackend: Send + Sync {
    async fn detect(&self, image: &ImagePayload) -> Result<DetectionOutcome, BackendError>;

    async fn remove(
        &self,
        image: &ImagePayload,
        people: &[DetectedPerson],
    ) -> Result<RemovalOutcome, BackendError>;
}

/// [`EditingBackend`] backed by the SnapClean HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| BackendError::InvalidResponse(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl EditingBackend for HttpBackend {
    async fn detect(&self, image: &ImagePayload) -> Result<DetectionOutcome, BackendError> {
        let request = DetectRequest {
            image_data: Some(image.clone()),
        };
        let response: DetectResponse = self.post("/api/detect", &request).await?;
        if !response.success {
            return Err(BackendError::InvalidResponse(
                "detect response reported failure".to_string(),
            ));
        }
        Ok(response.into())
    }

    async fn remove(
        &self,
        image: &ImagePayload,
        people: &[DetectedPerson],
    ) -> Result<RemovalOutcome, BackendError> {
        let request = ProcessRequest {
            image_data: Some(image.clone()),
            selected_people: Some(people.to_vec()),
        };
        let response: ProcessResponse = self.post("/api/process", &request).await?;
        if !response.success {
            return Err(BackendError::InvalidResponse(
                "process response reported failure".to_string(),
            ));
        }
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_detect_posts_image_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/detect"))
            .and(body_partial_json(serde_json::json!({"imageData": "data:image/png;base64,AA=="})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "detections": [
                    {"id": "1", "x": 1, "y": 2, "width": 3, "height": 4, "confidence": 0.5, "selected": true}
                ],
                "message": "Detected 1 person in the image",
                "mode": "live"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = backend(&server)
            .detect(&ImagePayload::new("data:image/png;base64,AA=="))
            .await
            .unwrap();
        assert_eq!(outcome.people.len(), 1);
        assert_eq!(outcome.mode, ProviderMode::Live);
        assert_eq!(outcome.message, "Detected 1 person in the image");
    }

    #[tokio::test]
    async fn test_process_sends_selected_people() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/process"))
            .and(body_partial_json(serde_json::json!({
                "selectedPeople": [{"id": "3"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "cleanedImage": "data:image/png;base64,BB==",
                "message": "Successfully removed 1 person from the image",
                "mode": "live"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let person = DetectedPerson::new("3", 450, 200, 75, 115, 0.92);
        let outcome = backend(&server)
            .remove(&ImagePayload::new("data:image/png;base64,AA=="), &[person])
            .await
            .unwrap();
        assert_eq!(outcome.image.as_str(), "data:image/png;base64,BB==");
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/detect"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "error": "No image data provided"
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .detect(&ImagePayload::new(""))
            .await
            .unwrap_err();
        match err {
            BackendError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No image data provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/process"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .remove(&ImagePayload::new("x"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }
}
