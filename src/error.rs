//! Error types for the coomer-downloader application.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid profile URL: {0}")]
    InvalidProfileUrl(String),

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    // Transfer errors
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("{operation} timed out after {}s", .after.as_secs_f64())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Download cancelled")]
    Cancelled,

    // File system errors
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether another attempt at the same request could succeed.
    ///
    /// Transport failures, timeouts and non-success statuses are transient.
    /// Local filesystem problems, bad input and cancellation are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::HttpStatus { .. } | Error::Timeout { .. }
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const SOME_DOWNLOADS_FAILED: i32 = 6;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let status = Error::HttpStatus {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            url: "http://example.com/a.mp4".to_string(),
        };
        assert!(status.is_transient());

        let timeout = Error::Timeout {
            operation: "size probe",
            after: Duration::from_secs(10),
        };
        assert!(timeout.is_transient());

        let io = Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(!io.is_transient());
        assert!(!Error::Cancelled.is_transient());
    }

    #[test]
    fn test_timeout_message() {
        let err = Error::Timeout {
            operation: "size probe",
            after: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "size probe timed out after 10s");
    }
}
