//! HTTP request/response schemas.
//!
//! Field names are camelCase on the wire to stay compatible with the browser
//! client.

use serde::{Deserialize, Serialize};

use crate::image::ImagePayload;
use crate::person::DetectedPerson;

/// Which provider produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// Hosted inference provider
    Live,
    /// Deterministic placeholder data
    #[default]
    Demo,
}

impl ProviderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderMode::Live => "live",
            ProviderMode::Demo => "demo",
        }
    }
}

impl std::fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `POST /api/detect` body. Fields are optional so that missing input can be
/// reported as a 400 rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImagePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub success: bool,
    pub detections: Vec<DetectedPerson>,
    pub message: String,
    #[serde(default)]
    pub mode: ProviderMode,
}

impl DetectResponse {
    pub fn new(detections: Vec<DetectedPerson>, message: impl Into<String>, mode: ProviderMode) -> Self {
        Self {
            success: true,
            detections,
            message: message.into(),
            mode,
        }
    }
}

/// `POST /api/process` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImagePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_people: Option<Vec<DetectedPerson>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub cleaned_image: ImagePayload,
    pub message: String,
    #[serde(default)]
    pub mode: ProviderMode,
}

impl ProcessResponse {
    pub fn new(cleaned_image: ImagePayload, message: impl Into<String>, mode: ProviderMode) -> Self {
        Self {
            success: true,
            cleaned_image,
            message: message.into(),
            mode,
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_request_uses_camel_case() {
        let req: ProcessRequest = serde_json::from_str(
            r#"{"imageData":"data:image/png;base64,AA==","selectedPeople":[{"id":"1","x":0,"y":0,"width":2,"height":2,"confidence":0.9,"selected":true}]}"#,
        )
        .unwrap();
        assert_eq!(req.image_data.unwrap().as_str(), "data:image/png;base64,AA==");
        assert_eq!(req.selected_people.unwrap().len(), 1);
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let req: ProcessRequest = serde_json::from_str("{}").unwrap();
        assert!(req.image_data.is_none());
        assert!(req.selected_people.is_none());

        let req: DetectRequest = serde_json::from_str("{}").unwrap();
        assert!(req.image_data.is_none());
    }

    #[test]
    fn test_responses_carry_success_flag() {
        let ok = ProcessResponse::new(ImagePayload::new("x"), "done", ProviderMode::Live);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["cleanedImage"], "x");
        assert_eq!(json["mode"], "live");

        let err = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "nope");
    }
}
