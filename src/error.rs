use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::images::ImageError;

/// Failures surfaced at the HTTP boundary as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized.")]
    Unauthorized,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Image resolution or fetch failure, already mapped to the status the
    /// calling endpoint reports.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Generation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Image failures as reported by the public proxy endpoint.
    pub fn from_proxy(err: ImageError) -> Self {
        let status = match &err {
            ImageError::Resolution => StatusCode::UNPROCESSABLE_ENTITY,
            ImageError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ImageError::SharePage { .. } | ImageError::UpstreamFetch { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        ApiError::Upstream {
            status,
            message: err.to_string(),
        }
    }

    /// Image failures as reported by the metadata generator.
    pub fn from_generation_source(err: ImageError) -> Self {
        let status = match &err {
            ImageError::Resolution => StatusCode::UNPROCESSABLE_ENTITY,
            ImageError::InvalidUrl(_)
            | ImageError::SharePage { .. }
            | ImageError::UpstreamFetch { .. } => StatusCode::BAD_REQUEST,
        };
        ApiError::Upstream {
            status,
            message: err.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Configuration(_)
            | ApiError::Generation(_)
            | ApiError::Database(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                "Database error.".to_string()
            }
            ApiError::Internal(e) => {
                error!("Internal error: {}", e);
                "Internal server error.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
