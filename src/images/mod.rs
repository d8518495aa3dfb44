mod error;
mod fetch;
mod handlers;
mod resolver;

pub use error::ImageError;
pub use fetch::{FetchedImage, ImageFetcher};
pub use handlers::image_proxy_handler;
pub use resolver::{ImageResolver, PatternExtractor, ShareLinkExtractor, rewrite_view_box};

use crate::FetchConfig;
use std::time::Duration;
use tracing::debug;

/// Path segment that marks an indirect share page rather than raw image bytes.
pub const SHARE_LINK_MARKER: &str = "/photos/share/";

pub fn is_share_link(url: &str) -> bool {
    url.contains(SHARE_LINK_MARKER)
}

/// Browser-facing `src` for a stored photo URL. Share links go through the
/// proxy; direct URLs are used as-is.
pub fn image_src(url: &str) -> String {
    if is_share_link(url) {
        format!("/api/image?url={}", urlencoding::encode(url))
    } else {
        url.to_string()
    }
}

/// Resolver and fetcher sharing one HTTP client.
#[derive(Clone)]
pub struct ImageService {
    resolver: ImageResolver,
    fetcher: ImageFetcher,
}

impl ImageService {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            resolver: ImageResolver::new(client.clone()),
            fetcher: ImageFetcher::new(
                client,
                config.max_attempts,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        })
    }

    /// Resolve a stored URL and download the image behind it.
    pub async fn load(&self, url: &str) -> Result<FetchedImage, ImageError> {
        validate_http_url(url)?;
        let resolved = self.resolver.resolve(url).await?;
        if resolved != url {
            debug!("Resolved share link {} to {}", url, resolved);
            validate_http_url(&resolved)?;
        }
        self.fetcher.fetch(&resolved).await
    }
}

fn validate_http_url(raw: &str) -> Result<(), ImageError> {
    let parsed = url::Url::parse(raw).map_err(|_| ImageError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ImageError::InvalidUrl(raw.to_string())),
    }
}
