use super::ImageError;
use axum::body::Bytes;
use reqwest::{
    StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use std::time::Duration;
use tracing::{debug, warn};

const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

impl FetchedImage {
    pub fn to_data_url(&self) -> String {
        use base64::{Engine, engine::general_purpose};
        format!(
            "data:{};base64,{}",
            self.content_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Downloads image bytes, retrying only on 503.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl ImageFetcher {
    pub fn new(client: reqwest::Client, max_attempts: u32, retry_backoff: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_backoff,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError> {
        let mut last_status = None;

        for attempt in 1..=self.max_attempts {
            let response = match self.client.get(url).header(ACCEPT, IMAGE_ACCEPT).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Image request to {} failed: {}", url, e);
                    break;
                }
            };

            let status = response.status();
            if status.is_success() {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .filter(|value| !value.is_empty())
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();

                let bytes = response.bytes().await.map_err(|e| {
                    warn!("Failed to read image body from {}: {}", url, e);
                    ImageError::UpstreamFetch { status: None }
                })?;

                debug!(
                    "Fetched {} bytes of {} from {} (attempt {})",
                    bytes.len(),
                    content_type,
                    url,
                    attempt
                );
                return Ok(FetchedImage {
                    bytes,
                    content_type,
                });
            }

            last_status = Some(status.as_u16());

            if status == StatusCode::SERVICE_UNAVAILABLE && attempt < self.max_attempts {
                let delay = self.retry_backoff * attempt;
                warn!(
                    "Image host returned 503 for {}, retrying in {:?} (attempt {}/{})",
                    url, delay, attempt, self.max_attempts
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            warn!("Image host returned {} for {}", status, url);
            break;
        }

        Err(ImageError::UpstreamFetch {
            status: last_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_encoding() {
        let image = FetchedImage {
            bytes: Bytes::from_static(b"abc"),
            content_type: "image/png".to_string(),
        };
        assert_eq!(image.to_data_url(), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn test_connection_failure_reports_unknown_status() {
        let fetcher = ImageFetcher::new(reqwest::Client::new(), 3, Duration::from_millis(1));
        let err = fetcher.fetch("http://127.0.0.1:1/a.jpg").await.unwrap_err();

        assert!(matches!(err, ImageError::UpstreamFetch { status: None }));
        assert_eq!(err.to_string(), "Failed to fetch image: unknown");
    }
}
