use super::{CreatePhotoRequest, Photo, UpdatePhotoRequest};
use crate::{AppState, admin::AdminSession, error::ApiError};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::info;

pub async fn list_photos_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Photo>>, ApiError> {
    let photos = app_state.photos.list().await?;
    Ok(Json(photos))
}

pub async fn create_photo_handler(
    session: AdminSession,
    State(app_state): State<AppState>,
    payload: Result<Json<CreatePhotoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Photo>), ApiError> {
    let Json(request) = payload?;
    let new_photo = request.into_new_photo()?;

    let photo = app_state.photos.insert(new_photo).await?;
    info!("{} created photo {}", session.username, photo.id);

    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn update_photo_handler(
    session: AdminSession,
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePhotoRequest>, JsonRejection>,
) -> Result<Json<Photo>, ApiError> {
    let Json(request) = payload?;
    let update = request.into_update()?;
    if update.is_empty() {
        return Err(ApiError::Validation("No fields to update.".to_string()));
    }

    let photo = app_state
        .photos
        .update(&id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photo not found.".to_string()))?;
    info!("{} updated photo {}", session.username, photo.id);

    Ok(Json(photo))
}

pub async fn delete_photo_handler(
    session: AdminSession,
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    app_state.photos.delete(&id).await?;
    info!("{} deleted photo {}", session.username, id);

    Ok(Json(json!({ "ok": true })))
}
