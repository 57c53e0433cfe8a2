//! Error types for the chart core.

use crate::models::AnnotationId;
use thiserror::Error;

/// Failure talking to a price source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Wrap a reqwest error, singling out timeouts
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err)
        }
    }
}

/// Rejected mutation of the series buffer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("Point at {timestamp} does not advance past newest point at {newest}")]
    OutOfOrder { timestamp: i64, newest: i64 },
}

/// Renderer-side failure. The controller logs these and carries on.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("Unknown annotation: {0}")]
    UnknownAnnotation(AnnotationId),

    #[error("Renderer backend error: {0}")]
    Backend(String),
}

/// Configuration could not be loaded or failed validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
