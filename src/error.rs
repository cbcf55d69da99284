//! Error types for a3s-output

use thiserror::Error;

/// Errors that can occur while delivering an alert to an output
#[derive(Debug, Error)]
pub enum OutputError {
    /// Sink unreachable or handshake failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Event could not be encoded into a payload
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Sink rejected or could not accept the payload
    #[error("Failed to publish alert to subject '{subject}': {reason}")]
    Publish {
        subject: String,
        reason: String,
    },

    /// Flush or close failure while tearing down a session
    #[error("Release error: {0}")]
    Release(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric registration or export failure
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<prometheus::Error> for OutputError {
    fn from(e: prometheus::Error) -> Self {
        OutputError::Metrics(e.to_string())
    }
}

/// Result type alias for output operations
pub type Result<T> = std::result::Result<T, OutputError>;
