//! Person removal handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use snapclean_models::{ProcessRequest, ProcessResponse};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// POST /api/process
///
/// Erases the selected people from the image. When the provider fails the
/// original image comes back with a message saying nothing was removed.
pub async fn process_image(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessResponse>> {
    let Json(request) = payload?;

    let (image, people) = match (request.image_data, request.selected_people) {
        (Some(image), Some(people)) if !image.is_empty() => (image, people),
        _ => return Err(ApiError::bad_request("Missing image data or selected people")),
    };

    image
        .validate_upload(state.config.max_image_bytes)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if let Some(person) = people.iter().find(|p| !p.is_valid()) {
        return Err(ApiError::Validation(format!(
            "Invalid region for person {}",
            person.id
        )));
    }

    info!(image = %image, count = people.len(), "Removal requested");

    let removal = state.removal.remove(&image, &people).await.map_err(|e| {
        error!("Removal failed: {}", e);
        ApiError::internal("Failed to process image")
    })?;

    metrics::record_removal(removal.mode.as_str(), people.len());

    Ok(Json(ProcessResponse::new(
        removal.image,
        removal.message,
        removal.mode,
    )))
}
