use thiserror::Error;

/// Errors that can occur when fetching from an external feed.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Feed returned no usable data: {0}")]
    Empty(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}
