//! Error types for the scan-archiver application.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // Catalog errors
    #[error("Search failed: {0}")]
    Search(String),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    // Progress checkpoint errors
    #[error("Corrupted progress file: {0}")]
    CorruptProgress(String),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // Post-processing errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("No images found in {}", .0.display())]
    NoImages(PathBuf),

    // Interactive prompt errors
    #[error("Prompt error: {0}")]
    Prompt(dialoguer::Error),

    #[error("Interrupted by user")]
    Aborted,

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

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error is a network-level failure worth retrying.
    ///
    /// HTTP status codes never reach this path: a response with any status is
    /// a successful exchange as far as retrying is concerned.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            _ => false,
        }
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {
                Error::Aborted
            }
            other => Error::Prompt(other),
        }
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const POSTPROCESS_ERROR: i32 = 5;
    pub const UNEXPECTED_ERROR: i32 = 6;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_is_transient() {
        assert!(Error::Network("connection reset".into()).is_transient());
    }

    #[test]
    fn test_other_errors_are_not_transient() {
        assert!(!Error::Search("HTTP 500".into()).is_transient());
        assert!(!Error::CorruptProgress("abc".into()).is_transient());
        let exhausted = Error::RetriesExhausted {
            attempts: 5,
            source: Box::new(Error::Network("timeout".into())),
        };
        assert!(!exhausted.is_transient());
    }

    #[test]
    fn test_interrupted_prompt_maps_to_aborted() {
        let io = std::io::Error::new(std::io::ErrorKind::Interrupted, "ctrl-c");
        let err: Error = dialoguer::Error::IO(io).into();
        assert!(matches!(err, Error::Aborted));
    }
}
