use crate::{AppState, error::ApiError};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

/// Public caching policy for proxied images: 7 days, 1 day stale-while-revalidate.
pub const PROXY_CACHE_CONTROL: &str = "public, max-age=604800, stale-while-revalidate=86400";

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    url: Option<String>,
}

pub async fn image_proxy_handler(
    State(app_state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ApiError> {
    let url = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Missing url parameter".to_string()))?;

    let image = app_state
        .images
        .load(&url)
        .await
        .map_err(ApiError::from_proxy)?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, PROXY_CACHE_CONTROL.to_string()),
        ],
        image.bytes,
    )
        .into_response())
}
