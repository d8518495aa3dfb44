use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::{error, info, warn};

use super::{AdminSession, LoginRequest, SESSION_TTL_SECS, SessionData, verify_password};
use crate::{AppState, error::ApiError, gallery::PhotoView};

pub async fn login_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    let username = request.username.as_deref().map(str::trim).unwrap_or("");
    let password = request.password.as_deref().unwrap_or("");
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password required.".to_string(),
        ));
    }

    let Some(user) = app_state.admins.find_by_username(username).await? else {
        warn!("Login attempt for unknown admin {}", username);
        return Err(ApiError::InvalidCredentials);
    };

    let password = password.to_string();
    let password_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| ApiError::Internal(format!("Password check panicked: {}", e)))?
        .map_err(ApiError::Internal)?;

    if !valid {
        warn!("Failed login for admin {}", user.username);
        return Err(ApiError::InvalidCredentials);
    }

    let session = SessionData::new(user.id, &user.username, SESSION_TTL_SECS);
    let token = app_state.sessions.seal(&session)?;
    let cookie = app_state.sessions.session_cookie(&token);

    info!("Admin {} logged in", user.username);

    Ok(([(SET_COOKIE, cookie)], Json(json!({ "ok": true }))))
}

pub async fn logout_handler(
    session: AdminSession,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    info!("Admin {} logged out", session.username);
    (
        [(SET_COOKIE, app_state.sessions.clear_cookie())],
        Json(json!({ "ok": true })),
    )
}

pub async fn admin_root_handler(State(app_state): State<AppState>, headers: HeaderMap) -> Redirect {
    if app_state.sessions.authenticate(&headers).is_some() {
        Redirect::to("/admin/dashboard")
    } else {
        Redirect::to("/admin/login")
    }
}

pub async fn login_page(State(app_state): State<AppState>, headers: HeaderMap) -> Response {
    if app_state.sessions.authenticate(&headers).is_some() {
        return Redirect::to("/admin/dashboard").into_response();
    }

    app_state
        .template_engine
        .render_page("admin_login.html.liquid", liquid::object!({}))
        .await
}

pub async fn dashboard_page(State(app_state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session) = app_state.sessions.authenticate(&headers) else {
        return Redirect::to("/admin/login").into_response();
    };

    let photos: Vec<PhotoView> = match app_state.photos.list().await {
        Ok(photos) => photos.iter().map(PhotoView::from).collect(),
        Err(e) => {
            error!("Failed to list photos for dashboard: {}", e);
            Vec::new()
        }
    };

    let globals = liquid::object!({
        "username": session.username,
        "photos": photos,
        "ai_enabled": app_state.vision.is_configured(),
    });

    app_state
        .template_engine
        .render_page("admin_dashboard.html.liquid", globals)
        .await
}
