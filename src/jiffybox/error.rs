//! Error types for the JiffyBox client.

use thiserror::Error;

use crate::backend::ApiError;

/// Errors raised by the JiffyBox client and backend.
#[derive(Debug, Error)]
pub enum JiffyBoxError {
    /// Transport failure or timeout.
    #[error("JiffyBox request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API returned no result and one or more error messages.
    #[error("JiffyBox API error: {0}")]
    Api(String),
    /// The box or other object does not exist.
    #[error("JiffyBox object not found: {0}")]
    NotFound(String),
    /// The response body did not match the expected shape.
    #[error("unable to decode JiffyBox response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The operation is not offered by JiffyBox.
    #[error("JiffyBox does not support {0}")]
    Unsupported(&'static str),
}

impl ApiError for JiffyBoxError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported(operation)
    }
}
