//! Error types for the paybridge core library
//!
//! Construction and configuration failures surface as [`Error`]. Failures of an
//! individual provider call are classified into [`ClassifiedError`] instead, see
//! [`crate::http::error`].

use thiserror::Error;

use crate::http::error::{ClassifiedError, ErrorKind};

/// Main error type for client construction and configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The underlying HTTP client could not be built
    #[error("HTTP client error: {message}")]
    HttpClient {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A provider call failed after classification
    #[error(transparent)]
    Provider(#[from] ClassifiedError),

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error without an underlying source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Classification of the wrapped provider failure, if this is one
    pub fn provider_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Provider(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("base URL is empty");
        assert_eq!(err.to_string(), "Configuration error: base URL is empty");
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let classified = ClassifiedError::new(ErrorKind::NotFound, "Resource not found")
            .with_status(404);
        let err: Error = classified.into();

        assert_eq!(err.provider_kind(), Some(ErrorKind::NotFound));
        assert!(err.to_string().contains("Resource not found"));
    }

    #[test]
    fn test_json_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json { .. }));
        assert_eq!(err.provider_kind(), None);
    }
}
