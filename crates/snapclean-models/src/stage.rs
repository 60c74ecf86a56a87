//! Editing session processing stages.

use serde::{Deserialize, Serialize};

/// Phase of an editing session in the upload → detect → process → complete pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStage {
    /// No image yet
    #[default]
    Upload,
    /// Detection running, or detections awaiting the user's selection
    Detect,
    /// Removal running, or the last removal attempt failed
    Process,
    /// A cleaned image is available
    Complete,
}

impl ProcessingStage {
    /// Get string representation of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStage::Upload => "upload",
            ProcessingStage::Detect => "detect",
            ProcessingStage::Process => "process",
            ProcessingStage::Complete => "complete",
        }
    }

    /// Check if this is the final stage of the pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStage::Complete)
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current stage plus a progress indicator and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StageStatus {
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub message: String,
}

impl StageStatus {
    pub fn new(stage: ProcessingStage, progress: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: progress.min(100),
            message: message.into(),
        }
    }
}
