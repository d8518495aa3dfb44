use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::{AppState, images::image_src, photos::Photo};

/// A photo as the page templates see it.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    /// What an `<img src>` should point at: the proxy for share links,
    /// the stored URL otherwise.
    pub image_src: String,
    pub detail_url: String,
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub settings: Option<String>,
    pub location: Option<String>,
    pub film: Option<String>,
    pub tags: Vec<String>,
    pub tags_text: String,
    pub sort_order: i64,
    pub created_at: String,
}

impl From<&Photo> for PhotoView {
    fn from(photo: &Photo) -> Self {
        let tags_text = photo.tags.clone().unwrap_or_default();
        let tags = split_tags(&tags_text);

        Self {
            id: photo.id.clone(),
            title: photo.title.clone(),
            description: photo.description.clone(),
            url: photo.url.clone(),
            image_src: image_src(&photo.url),
            detail_url: format!("/photo/{}", photo.id),
            camera: photo.camera.clone(),
            lens: photo.lens.clone(),
            settings: photo.settings.clone(),
            location: photo.location.clone(),
            film: photo.film.clone(),
            tags,
            tags_text,
            sort_order: photo.sort_order,
            created_at: photo.created_at.to_rfc3339(),
        }
    }
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn gallery_handler(State(app_state): State<AppState>) -> Response {
    // A broken store still serves the page, just empty.
    let photos: Vec<PhotoView> = match app_state.photos.list().await {
        Ok(photos) => photos.iter().map(PhotoView::from).collect(),
        Err(e) => {
            error!("Failed to list photos: {}", e);
            Vec::new()
        }
    };

    let globals = liquid::object!({
        "photos": photos,
        "base_url": app_state.config.app.base_url.as_deref().unwrap_or(""),
    });

    app_state
        .template_engine
        .render_page("index.html.liquid", globals)
        .await
}

pub async fn photo_detail_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let photo = match app_state.photos.get(&id).await {
        Ok(Some(photo)) => photo,
        Ok(None) => return (StatusCode::NOT_FOUND, "Photo not found").into_response(),
        Err(e) => {
            error!("Failed to load photo {}: {}", id, e);
            return (StatusCode::NOT_FOUND, "Photo not found").into_response();
        }
    };

    let view = PhotoView::from(&photo);
    let globals = liquid::object!({
        "photo": view,
        "base_url": app_state.config.app.base_url.as_deref().unwrap_or(""),
    });

    app_state
        .template_engine
        .render_page("photo.html.liquid", globals)
        .await
}
