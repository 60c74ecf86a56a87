//! Shared data models for SnapClean.
//!
//! This crate provides Serde-serializable types for:
//! - Detected people and their selection state
//! - Processing stages of an editing session
//! - Opaque image payloads (data URIs or remote URLs)
//! - Request/response schemas of the HTTP API

pub mod api;
pub mod error;
pub mod image;
pub mod person;
pub mod stage;

// Re-export common types
pub use api::{
    DetectRequest, DetectResponse, ErrorResponse, ProcessRequest, ProcessResponse, ProviderMode,
};
pub use error::{ModelError, ModelResult};
pub use image::{ImagePayload, MAX_UPLOAD_BYTES};
pub use person::DetectedPerson;
pub use stage::{ProcessingStage, StageStatus};
