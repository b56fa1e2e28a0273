//! Domain error types
//!
//! This module defines the error hierarchy for queuewatch.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main queuewatch error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum QueueWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Hospital site scraping errors
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// Notification dispatch errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Cron scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Scrape-specific errors
///
/// Errors that occur when talking to a hospital web site.
/// These errors don't expose the HTTP client's own types.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Failed to reach the hospital site
    #[error("Failed to connect to hospital site: {0}")]
    ConnectionFailed(String),

    /// Non-2xx HTTP status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Page did not have the expected shape
    #[error("Unexpected page shape: {0}")]
    Parse(String),

    /// Body could not be decoded
    #[error("Failed to decode response body: {0}")]
    Encoding(String),
}

impl ScrapeError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::ConnectionFailed(_) | ScrapeError::Timeout(_) => true,
            ScrapeError::HttpStatus { .. } => true,
            ScrapeError::Parse(_) | ScrapeError::Encoding(_) => false,
        }
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            }
        } else if err.is_decode() || err.is_body() {
            ScrapeError::Encoding(err.to_string())
        } else {
            ScrapeError::ConnectionFailed(err.to_string())
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for QueueWatchError {
    fn from(err: std::io::Error) -> Self {
        QueueWatchError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for QueueWatchError {
    fn from(err: serde_json::Error) -> Self {
        QueueWatchError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for QueueWatchError {
    fn from(err: toml::de::Error) -> Self {
        QueueWatchError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueueWatchError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_scrape_error_conversion() {
        let scrape_err = ScrapeError::Parse("no table".to_string());
        let err: QueueWatchError = scrape_err.into();
        assert!(matches!(err, QueueWatchError::Scrape(_)));
        assert_eq!(err.to_string(), "Scrape error: Unexpected page shape: no table");
    }

    #[test]
    fn test_http_status_display() {
        let err = ScrapeError::HttpStatus {
            status: 503,
            url: "https://example.org/x".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503 from https://example.org/x");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ScrapeError::Timeout("t".to_string()).is_transient());
        assert!(ScrapeError::ConnectionFailed("c".to_string()).is_transient());
        assert!(!ScrapeError::Parse("p".to_string()).is_transient());
        assert!(!ScrapeError::Encoding("e".to_string()).is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: QueueWatchError = io_err.into();
        assert!(matches!(err, QueueWatchError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: QueueWatchError = json_err.into();
        assert!(matches!(err, QueueWatchError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: QueueWatchError = toml_err.into();
        assert!(matches!(err, QueueWatchError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
