use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use super::{GenerateError, GenerateRequest, GeneratedMetadata, generate_metadata};
use crate::{AppState, admin::AdminSession, error::ApiError};

/// Checks run in order: session, credentials, then the body.
pub async fn generate_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GeneratedMetadata>, ApiError> {
    if !app_state.vision.is_configured() {
        return Err(GenerateError::NotConfigured.into());
    }

    let Json(request) = payload?;
    let image_url = request
        .image_url()
        .ok_or_else(|| ApiError::Validation("imageUrl is required.".to_string()))?;

    let metadata = generate_metadata(
        &app_state.images,
        app_state.vision.as_ref(),
        image_url,
        request.location(),
        request.field(),
    )
    .await?;

    Ok(Json(metadata))
}
