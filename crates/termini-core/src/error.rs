//! Error types for the slot crawler.
//!
//! All fallible library operations return [`Result`]. Fragment-level parse
//! trouble is not represented here: a fragment that cannot be read is
//! dropped, not raised.

use thiserror::Error;

/// Error type for crawl and storage operations
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// All retry attempts for one request were exhausted
    #[error("retrieval failed for {url} after {attempts} attempts: {last_error}")]
    Retrieval {
        /// URL of the request that kept failing
        url: String,
        /// Number of attempts made before giving up
        attempts: u32,
        /// Text of the last transport error or HTTP status
        last_error: String,
    },

    /// A CSS selector could not be compiled
    #[error("invalid selector: {0}")]
    Selector(String),

    /// The slot store failed
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem access around the store or debug dumps failed
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for crawl and storage operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_display() {
        let error = ScrapeError::Retrieval {
            url: "https://example.test/page".to_string(),
            attempts: 3,
            last_error: "HTTP 503".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "retrieval failed for https://example.test/page after 3 attempts: HTTP 503"
        );
    }

    #[test]
    fn test_selector_display() {
        let error = ScrapeError::Selector("div..broken".to_string());
        assert_eq!(error.to_string(), "invalid selector: div..broken");
    }
}
