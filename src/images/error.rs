use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch share page: {}", display_status(.status))]
    SharePage { status: Option<u16> },

    #[error("Could not extract image URL from share link.")]
    Resolution,

    #[error("Failed to fetch image: {}", display_status(.status))]
    UpstreamFetch { status: Option<u16> },
}

fn display_status(status: &Option<u16>) -> String {
    status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
