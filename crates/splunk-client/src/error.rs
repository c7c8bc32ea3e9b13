//! Error types for the Splunk client.

use thiserror::Error;

/// Errors that can occur when reading or writing Splunk resources.
#[derive(Debug, Error)]
pub enum SplunkError {
    /// The server's representation was malformed or structurally unexpected.
    #[error("parse error: {0}")]
    Parse(String),

    /// An update could not satisfy a field the server requires.
    #[error("missing required field `{field}` for {kind} update")]
    MissingRequiredField { kind: String, field: String },

    /// An attribute key or a resource path did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A value could not be coerced or encoded.
    #[error("invalid value for `{key}`: expected {expected}")]
    InvalidValue { key: String, expected: &'static str },

    /// A typed view was requested for an entity of another kind.
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: String,
    },

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failures reported by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },
}

impl From<quick_xml::Error> for SplunkError {
    fn from(err: quick_xml::Error) -> Self {
        SplunkError::Parse(format!("XML error: {err}"))
    }
}

impl From<reqwest::Error> for SplunkError {
    fn from(err: reqwest::Error) -> Self {
        SplunkError::Transport(TransportError::Http(err))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = SplunkError> = std::result::Result<T, E>;
