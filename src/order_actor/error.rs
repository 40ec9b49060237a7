//! Error types for the order actor.

use crate::api::ApiError;
use crate::model::{OrderId, OrderStatus, Role};
use reconcile_actor::FrameworkError;
use thiserror::Error;

/// Errors that can occur during order operations.
///
/// None of these change an order's displayed status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Not signed in")]
    NotAuthenticated,

    /// The order is not on this board; refresh first.
    #[error("Order not found: {0}")]
    UnknownOrder(OrderId),

    #[error("A {role} may not move an order from {from} to {to}")]
    NotPermitted {
        role: Role,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Completing a delivery requires the customer's confirmation code")]
    MissingConfirmationCode,

    /// The server rejected the transition or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An error occurred while communicating with the actor system. A busy lane means a
    /// transition for the same order is still awaiting acknowledgement.
    #[error("Actor communication error: {0}")]
    Framework(#[from] FrameworkError),

    #[error("Unexpected actor output: {0}")]
    UnexpectedOutput(String),
}

impl OrderError {
    /// True when the command was refused because another transition on the same order is
    /// still in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, OrderError::Framework(FrameworkError::LaneBusy(_)))
    }
}
