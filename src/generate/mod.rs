//! Photo metadata suggestions from a vision-capable chat model.

mod error;
mod handlers;
mod openai;
mod prompt;
mod service;
mod types;

pub use error::GenerateError;
pub use handlers::generate_handler;
pub use openai::OpenAiProvider;
pub use prompt::{build_prompt, parse_reply};
pub use service::generate_metadata;
pub use types::*;

use crate::GenerationConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// One round trip to a model that accepts a text prompt plus an image.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Sends the prompt and image, returning the model's text reply.
    async fn complete(&self, prompt: &str, image_data_url: &str) -> Result<String, GenerateError>;

    /// Whether credentials are present. Requests are refused up front when not.
    fn is_configured(&self) -> bool;

    fn model(&self) -> &str;
}

pub type DynVisionProvider = Arc<dyn VisionProvider>;

pub fn create_provider(config: &GenerationConfig) -> Result<DynVisionProvider, GenerateError> {
    Ok(Arc::new(OpenAiProvider::new(config)?))
}
