//! Error types for Courseplay Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Manifest errors
    #[error("Manifest verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),

    #[error("Invalid manifest format: {0}")]
    InvalidManifest(String),

    // Playback errors
    #[error("Your browser doesn't support HLS streaming")]
    UnsupportedFormat,

    #[error("Unsupported playback rate: {0}")]
    InvalidPlaybackRate(f64),

    #[error("No quality level at index {0}")]
    InvalidQuality(i64),

    // Catalog errors
    #[error("Failed to load video catalog: {0}")]
    Catalog(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Internal errors
    #[error("Player task is no longer running")]
    PlayerGone,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Verify(e) => e.is_retryable(),
            Error::Network(_) => true,
            _ => false,
        }
    }

    /// Returns the error code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Verify(VerifyError::NotFound) => "MANIFEST_NOT_FOUND",
            Error::Verify(VerifyError::Network(_)) => "MANIFEST_NETWORK",
            Error::Verify(VerifyError::Status(_)) => "MANIFEST_STATUS",
            Error::Verify(VerifyError::InvalidSignature) => "MANIFEST_SIGNATURE",
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            Error::InvalidManifest(_) => "INVALID_MANIFEST",
            Error::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            Error::InvalidPlaybackRate(_) => "INVALID_RATE",
            Error::InvalidQuality(_) => "INVALID_QUALITY",
            Error::Catalog(_) => "CATALOG",
            Error::Network(_) => "NETWORK",
            Error::Url(_) => "INVALID_URL",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::PlayerGone => "PLAYER_GONE",
            Error::Internal(_) => "INTERNAL",
        }
    }

    /// Plain string shown in place of the player surface
    pub fn user_message(&self) -> String {
        match self {
            Error::Verify(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Why a manifest failed verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("HTTP 404")]
    NotFound,

    #[error("HTTP {0}")]
    Status(u16),

    /// Transport failure: DNS, refused connection, CORS rejection, timeout
    #[error("CORS/network failure: {0}")]
    Network(String),

    #[error("Invalid HLS manifest format")]
    InvalidSignature,
}

impl VerifyError {
    /// Every verification failure is retried until the attempt bound is hit
    pub fn is_retryable(&self) -> bool {
        true
    }

    /// Message distinguishing "not found" from "CORS/network" from everything else
    pub fn user_message(&self) -> String {
        match self {
            VerifyError::NotFound => "Video not found on server".to_string(),
            VerifyError::Network(_) => "Network error (check CORS configuration)".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_user_messages() {
        assert_eq!(
            Error::from(VerifyError::NotFound).user_message(),
            "Video not found on server"
        );
        assert_eq!(
            Error::from(VerifyError::Network("refused".into())).user_message(),
            "Network error (check CORS configuration)"
        );
        assert_eq!(
            Error::from(VerifyError::InvalidSignature).user_message(),
            "Invalid HLS manifest format"
        );
        assert_eq!(Error::from(VerifyError::Status(503)).user_message(), "HTTP 503");
    }

    #[test]
    fn test_unsupported_is_verbatim() {
        let err = Error::UnsupportedFormat;
        assert_eq!(err.user_message(), "Your browser doesn't support HLS streaming");
        assert!(!err.is_recoverable());
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }
}
