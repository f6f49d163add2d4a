//! Error types for the DigitalOcean client.

use thiserror::Error;

use crate::backend::ApiError;

/// Errors raised by the DigitalOcean client and backend.
#[derive(Debug, Error)]
pub enum DigitalOceanError {
    /// Transport failure or timeout.
    #[error("DigitalOcean request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with `status: ERROR`.
    #[error("DigitalOcean API error: {0}")]
    Api(String),
    /// The API reported that the requested object does not exist.
    #[error("DigitalOcean object not found: {0}")]
    NotFound(String),
    /// The response body did not match the expected shape.
    #[error("unable to decode DigitalOcean response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The operation is not offered by DigitalOcean.
    #[error("DigitalOcean does not support {0}")]
    Unsupported(&'static str),
}

impl ApiError for DigitalOceanError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported(operation)
    }
}
