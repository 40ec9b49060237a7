//! Error types for the status actor.

use crate::api::ApiError;
use crate::model::Role;
use reconcile_actor::FrameworkError;
use thiserror::Error;

/// Errors that can occur while reading or changing driver and restaurant statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    /// The session has no bearer token.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The session's role may not perform this change.
    #[error("A {role} session may not {action}")]
    Forbidden { role: Role, action: &'static str },

    /// The server refused the change or could not be reached. The displayed status was
    /// reverted.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    Framework(#[from] FrameworkError),

    #[error("Unexpected actor output: {0}")]
    UnexpectedOutput(String),
}
