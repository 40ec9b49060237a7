//! # Framework Errors
//!
//! Errors raised by the runtime itself, independent of any entity. Every entity
//! error type must be `From<FrameworkError>` so a client call can surface them
//! through the entity's own error enum.

/// Errors that can occur within the actor runtime itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    /// A command arrived for a lane that already has one in flight and the
    /// lane's policy is [`BusyPolicy::Reject`](crate::BusyPolicy::Reject).
    #[error("Lane busy: {0}")]
    LaneBusy(String),
}
