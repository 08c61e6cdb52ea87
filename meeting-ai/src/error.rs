//! Error types for meeting AI operations.

use std::fmt;

/// Provider-agnostic error. Every provider implementation maps its native
/// failures onto these variants.
#[derive(Debug)]
pub enum Error {
    /// API key rejected, expired, or lacking permissions.
    Authentication(String),

    /// Connectivity failure. Usually transient.
    Network(String),

    /// Missing credentials or invalid parameters.
    Configuration(String),

    /// The provider answered with a business-level failure.
    Provider(String),

    /// Operation exceeded the configured or provider-enforced timeout period.
    Timeout(String),

    /// Requested resource (call, session, transcript) does not exist.
    NotFound(String),

    /// Provider rate limit exceeded. Clients must wait before retrying.
    RateLimited { retry_after_seconds: u64 },

    Serialization(String),

    /// The provider's response did not have the expected shape.
    Deserialization(String),

    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Provider(msg) => write!(f, "Provider error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::RateLimited {
                retry_after_seconds,
            } => {
                write!(f, "Rate limited: retry after {}s", retry_after_seconds)
            }
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<meeting_auth::Error> for Error {
    fn from(err: meeting_auth::Error) -> Self {
        use meeting_auth::error::HttpErrorKind;
        use meeting_auth::ErrorKind;

        match &err.error_kind {
            ErrorKind::ApiKey(_) => Error::Configuration(err.to_string()),
            ErrorKind::Webhook(_) => Error::Authentication(err.to_string()),
            ErrorKind::Http(HttpErrorKind::Timeout) => Error::Timeout(err.to_string()),
            ErrorKind::Http(_) => Error::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::Deserialization(err.to_string())
        } else {
            Error::Serialization(err.to_string())
        }
    }
}
