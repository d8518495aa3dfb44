use tracing::info;

use super::{GenerateField, GeneratedMetadata, VisionProvider, build_prompt, parse_reply};
use crate::{error::ApiError, images::ImageService};

/// Fetches the image behind `image_url`, asks the model about it, and
/// returns the requested fields. The model call is made exactly once.
pub async fn generate_metadata(
    images: &ImageService,
    vision: &dyn VisionProvider,
    image_url: &str,
    location: Option<&str>,
    field: GenerateField,
) -> Result<GeneratedMetadata, ApiError> {
    let image = images
        .load(image_url)
        .await
        .map_err(ApiError::from_generation_source)?;

    info!(
        "Generating {:?} for {} ({} bytes, {}) with {}",
        field,
        image_url,
        image.bytes.len(),
        image.content_type,
        vision.model()
    );

    let prompt = build_prompt(field, location);
    let reply = vision.complete(&prompt, &image.to_data_url()).await?;

    Ok(parse_reply(field, &reply)?)
}
