//! Error types for advisor-wire

use thiserror::Error;

/// Result type alias using advisor-wire Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat endpoint
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Endpoint answered with a non-success status
    #[error("API error: {status} {body}")]
    Status { status: u16, body: String },

    /// Stream was cancelled by the caller
    #[error("Request aborted")]
    Aborted,

    /// Body stream failed mid-read
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this is a caller-initiated cancellation rather than a failure
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// Check if opening the stream again could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            Error::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Error::Transport(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_server_errors() {
        for status in [500, 502, 503, 504, 429] {
            let e = Error::Status {
                status,
                body: String::new(),
            };
            assert!(e.is_retryable(), "{} should be retryable", status);
        }
    }

    #[test]
    fn test_not_retryable_client_errors() {
        for status in [400, 401, 403, 404, 422] {
            let e = Error::Status {
                status,
                body: "nope".into(),
            };
            assert!(!e.is_retryable(), "{} should not be retryable", status);
        }
    }

    #[test]
    fn test_abort_is_not_retryable() {
        assert!(Error::Aborted.is_aborted());
        assert!(!Error::Aborted.is_retryable());
        assert!(!Error::InvalidConfig("x".into()).is_aborted());
    }

    #[test]
    fn test_transport_error_retryable() {
        assert!(Error::Transport("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_status_display() {
        let e = Error::Status {
            status: 503,
            body: "Service Unavailable".into(),
        };
        assert_eq!(e.to_string(), "API error: 503 Service Unavailable");
    }
}
