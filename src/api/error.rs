//! Error types for calls against the ordering API.

use std::time::Duration;
use thiserror::Error;

/// How a remote call failed.
///
/// `Network` and `Timeout` mean no definitive answer reached us: the server may or may not
/// have applied the request, so callers resynchronize instead of assuming a rollback.
/// `Rejected` is a definitive application-level refusal and carries the server's message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// True when the request may or may not have reached the server.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }
}
