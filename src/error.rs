//! Error kinds shared by every pipeline stage.
//!
//! Collection and summarization failures are recoverable: they are retried
//! locally and then recorded against a single category. Only
//! [`NewsError::Config`] stops a run before it starts.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    /// Fetch timeout, connection failure or non-2xx response from the news source.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not look like the section page we expect.
    #[error("parse error: {0}")]
    Parse(String),

    /// The source or the LLM endpoint throttled us (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// LLM call failed or returned something unusable.
    #[error("api error: {0}")]
    Api(String),

    /// Missing credential or invalid setting; fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// The run deadline passed before this unit of work finished.
    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NewsError {
    /// Whether the retry combinator should try this operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NewsError::Network(_) | NewsError::Parse(_) | NewsError::RateLimit(_) | NewsError::Api(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(NewsError::Network("timeout".into()).is_retryable());
        assert!(NewsError::Parse("empty body".into()).is_retryable());
        assert!(NewsError::RateLimit("429".into()).is_retryable());
        assert!(NewsError::Api("bad json".into()).is_retryable());
        assert!(!NewsError::Config("missing key".into()).is_retryable());
        assert!(!NewsError::Cancelled("deadline".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_kind() {
        let e = NewsError::Config("OPENAI_API_KEY is not set".into());
        assert_eq!(e.to_string(), "configuration error: OPENAI_API_KEY is not set");
    }
}
