//! Person detection handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use snapclean_models::{DetectRequest, DetectResponse};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// POST /api/detect
///
/// Finds the people in an uploaded image. Provider failures are answered with
/// placeholder detections, so the only errors here are bad input.
pub async fn detect_people(
    State(state): State<AppState>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> ApiResult<Json<DetectResponse>> {
    let Json(request) = payload?;

    let image = request
        .image_data
        .filter(|image| !image.is_empty())
        .ok_or_else(|| ApiError::bad_request("No image data provided"))?;

    image
        .validate_upload(state.config.max_image_bytes)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    info!(image = %image, "Detection requested");

    let detection = state.detection.detect(&image).await.map_err(|e| {
        error!("Detection failed: {}", e);
        ApiError::internal("Failed to detect people in image")
    })?;

    metrics::record_detection(detection.mode.as_str(), detection.people.len());

    Ok(Json(DetectResponse::new(
        detection.people,
        detection.message,
        detection.mode,
    )))
}
