//! Error types for the MobyGames scraper
//!
//! Provides a single error enum with human-readable messages
//! and serialization for host UI layers.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all MobyGames scraper operations
///
/// Implements Display for human-readable messages and Serialize
/// so a dialog layer can forward the message unchanged.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// No API key is configured; the scraper disables itself
    #[error(
        "MobyGames API key not configured. Visit https://www.mobygames.com/info/api \
         for directions about how to get your key"
    )]
    NotConfigured,

    /// Transport failed before any response was received
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-200 status
    #[error("HTTP code {status} message \"{message}\"")]
    Http { status: u16, message: String },

    /// Quota exceeded (HTTP 429) and the retry budget is spent
    #[error("Rate limited - gave up after {retries} retries")]
    RateLimited { retries: u32 },

    /// User chose not to wait out the rate window
    #[error("Rate limit wait cancelled by user, scraper disabled")]
    Cancelled,

    /// Response body is not valid JSON
    #[error("Error decoding JSON data from MobyGames: {0}")]
    MalformedResponse(String),

    /// Image transfer did not produce a file, even after the retry
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Disk cache could not be read or written
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Serialize for ScraperError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_http() {
        let error = ScraperError::Http {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP code 401 message \"Invalid API key\"");
    }

    #[test]
    fn test_error_display_rate_limited() {
        let error = ScraperError::RateLimited { retries: 3 };
        assert_eq!(error.to_string(), "Rate limited - gave up after 3 retries");
    }

    #[test]
    fn test_error_display_not_configured_mentions_api_page() {
        let error = ScraperError::NotConfigured;
        assert!(error.to_string().contains("mobygames.com/info/api"));
    }

    #[test]
    fn test_error_display_malformed() {
        let error = ScraperError::MalformedResponse("expected value at line 1".to_string());
        assert_eq!(
            error.to_string(),
            "Error decoding JSON data from MobyGames: expected value at line 1"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: ScraperError = io.into();
        assert!(matches!(error, ScraperError::Io(_)));
    }

    #[test]
    fn test_error_serialize() {
        let error = ScraperError::Cancelled;
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"Rate limit wait cancelled by user, scraper disabled\"");
    }
}
