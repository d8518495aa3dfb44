use super::{ImageError, is_share_link};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

/// Finds the backing image URL inside a share page.
pub trait ShareLinkExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Option<String>;
}

// Tried in order; the first capture wins.
static SHARE_PAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"og:image['"\s]+content=['"]([^'"]+)['"]"#,
        r#"content=['"]([^'"]+)['"]\s+property=['"]og:image"#,
        r#"(https://content[^'"]*cdproxy/templink[^'"]+)"#,
        r#"(https://thumbnails-photos\.amazon\.[^'"]+)"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("share page pattern is valid"))
    .collect()
});

static VIEW_BOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"viewBox=[^&]+").expect("viewBox pattern is valid"));

const LARGE_VIEW_BOX: &str = "viewBox=2400%2C2400";

/// Ordered regex scan over the raw markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl ShareLinkExtractor for PatternExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        SHARE_PAGE_PATTERNS.iter().find_map(|pattern| {
            pattern
                .captures(html)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

/// Ask the CDN for a 2400x2400 render instead of whatever the page embedded.
pub fn rewrite_view_box(url: &str) -> String {
    VIEW_BOX.replace(url, LARGE_VIEW_BOX).into_owned()
}

#[derive(Clone)]
pub struct ImageResolver {
    client: reqwest::Client,
    extractor: Arc<dyn ShareLinkExtractor>,
}

impl ImageResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_extractor(client, Arc::new(PatternExtractor))
    }

    pub fn with_extractor(client: reqwest::Client, extractor: Arc<dyn ShareLinkExtractor>) -> Self {
        Self { client, extractor }
    }

    /// Returns a directly fetchable image URL. Direct URLs come back
    /// unchanged without touching the network.
    pub async fn resolve(&self, url: &str) -> Result<String, ImageError> {
        if !is_share_link(url) {
            return Ok(url.to_string());
        }

        debug!("Fetching share page: {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("Share page request failed for {}: {}", url, e);
            ImageError::SharePage { status: None }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Share page {} returned {}", url, status);
            return Err(ImageError::SharePage {
                status: Some(status.as_u16()),
            });
        }

        let html = response.text().await.map_err(|e| {
            warn!("Failed to read share page body for {}: {}", url, e);
            ImageError::SharePage { status: None }
        })?;

        let extracted = self.extractor.extract(&html).ok_or_else(|| {
            warn!("No image URL found in share page {}", url);
            ImageError::Resolution
        })?;

        Ok(rewrite_view_box(&extracted))
    }
}
