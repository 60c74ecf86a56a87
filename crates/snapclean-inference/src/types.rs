//! Provider request/response types and their normalization.
//!
//! Hosted detectors disagree on box encoding. We accept `x/y/width/height`,
//! corner pairs (`x1/y1/x2/y2`) and `bbox: [x1, y1, x2, y2]`, wrapped in
//! `detections`, `predictions` or `objects`, or as a bare array.

use serde::{Deserialize, Serialize};
use snapclean_models::{DetectedPerson, ImagePayload};

use crate::error::{InferenceError, InferenceResult};

/// Labels accepted as a person.
const PERSON_LABELS: &[&str] = &["person", "people", "human", "pedestrian"];

/// Body of a detection request.
#[derive(Debug, Clone, Serialize)]
pub struct DetectPayload<'a> {
    pub image: &'a ImagePayload,
}

/// Body of a removal request.
#[derive(Debug, Clone, Serialize)]
pub struct RemovePayload<'a> {
    pub image: &'a ImagePayload,
    pub regions: Vec<Region>,
}

/// Region to erase, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl From<&DetectedPerson> for Region {
    fn from(p: &DetectedPerson) -> Self {
        Self {
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
        }
    }
}

/// Detection response in any of the supported shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DetectionBody {
    Wrapped {
        #[serde(alias = "predictions", alias = "objects")]
        detections: Vec<UpstreamDetection>,
    },
    Bare(Vec<UpstreamDetection>),
}

impl DetectionBody {
    fn into_detections(self) -> Vec<UpstreamDetection> {
        match self {
            DetectionBody::Wrapped { detections } => detections,
            DetectionBody::Bare(detections) => detections,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamDetection {
    #[serde(flatten)]
    pub bbox: UpstreamBox,
    #[serde(default, alias = "class", alias = "name")]
    pub label: Option<String>,
    #[serde(default, alias = "score")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum UpstreamBox {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Corners {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Array {
        #[serde(alias = "box")]
        bbox: [f64; 4],
    },
}

impl UpstreamBox {
    /// Edges as (left, top, right, bottom).
    fn edges(&self) -> (f64, f64, f64, f64) {
        match *self {
            UpstreamBox::Rect {
                x,
                y,
                width,
                height,
            } => (x, y, x + width, y + height),
            UpstreamBox::Corners { x1, y1, x2, y2 } => {
                (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
            }
            UpstreamBox::Array { bbox: [x1, y1, x2, y2] } => {
                (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
            }
        }
    }
}

impl UpstreamDetection {
    fn is_person(&self) -> bool {
        match &self.label {
            None => true,
            Some(label) => PERSON_LABELS
                .iter()
                .any(|p| label.trim().eq_ignore_ascii_case(p)),
        }
    }

    /// Canonical box, or `None` when it collapses to zero area.
    fn to_person(&self, id: String) -> Option<DetectedPerson> {
        let (left, top, right, bottom) = self.bbox.edges();
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            return None;
        }

        let left = to_pixel(left);
        let top = to_pixel(top);
        let width = to_pixel(right).saturating_sub(left);
        let height = to_pixel(bottom).saturating_sub(top);
        if width == 0 || height == 0 {
            return None;
        }

        // Detectors that omit a score are treated as certain.
        let confidence = self.confidence.unwrap_or(1.0) as f32;
        Some(DetectedPerson::new(id, left, top, width, height, confidence))
    }
}

fn to_pixel(v: f64) -> u32 {
    v.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Convert a provider detection response into canonical people.
///
/// Non-person labels and degenerate boxes are dropped; ids are assigned
/// `"1".."n"` in upstream order and every person starts selected.
pub fn normalize_detections(body: DetectionBody) -> Vec<DetectedPerson> {
    body.into_detections()
        .iter()
        .filter(|d| d.is_person())
        .filter_map(|d| d.to_person(String::new()))
        .enumerate()
        .map(|(i, mut p)| {
            p.id = (i + 1).to_string();
            p
        })
        .collect()
}

/// Removal response in any of the supported shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct RemovalBody {
    #[serde(default, alias = "cleaned_image", alias = "cleanedImage")]
    pub image: Option<String>,
    #[serde(default)]
    pub output: Option<OneOrMany>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Extract the cleaned image from a provider removal response.
pub fn normalize_removal(body: RemovalBody) -> InferenceResult<ImagePayload> {
    let image = body.image.or(match body.output {
        Some(OneOrMany::One(s)) => Some(s),
        Some(OneOrMany::Many(v)) => v.into_iter().next(),
        None => None,
    });

    match image {
        Some(s) if !s.trim().is_empty() => Ok(ImagePayload::new(s)),
        _ => Err(InferenceError::InvalidResponse(
            "removal response carried no image".to_string(),
        )),
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
