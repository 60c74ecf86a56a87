//! Detected person regions.

use serde::{Deserialize, Serialize};

/// One candidate person region, in original image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPerson {
    /// Identifier, unique within a session
    pub id: String,
    /// X coordinate of the top-left corner
    pub x: u32,
    /// Y coordinate of the top-left corner
    pub y: u32,
    /// Box width (> 0)
    pub width: u32,
    /// Box height (> 0)
    pub height: u32,
    /// Detector certainty in [0, 1]
    pub confidence: f32,
    /// Whether the user wants this person removed
    #[serde(default = "default_selected")]
    pub selected: bool,
}

fn default_selected() -> bool {
    true
}

impl DetectedPerson {
    /// Create a new detection, selected for removal by default.
    ///
    /// Confidence is clamped into [0, 1]; NaN becomes 0.
    pub fn new(
        id: impl Into<String>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        confidence: f32,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            confidence,
            selected: true,
        }
    }

    /// Check the box is non-degenerate and confidence is in range.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && (0.0..=1.0).contains(&self.confidence)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Box area in pixels.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}
