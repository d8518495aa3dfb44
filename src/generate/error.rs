use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("OpenAI API key not configured.")]
    NotConfigured,

    #[error("Failed to build model client: {0}")]
    Client(String),

    #[error("Model request failed: {0}")]
    Request(String),

    #[error("Model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model reply was not valid JSON: {0}")]
    MalformedReply(String),
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::NotConfigured | GenerateError::Client(_) => {
                ApiError::Configuration(err.to_string())
            }
            other => ApiError::Generation(other.to_string()),
        }
    }
}
