//! Error types for the checkout coordinator.

use crate::api::ApiError;
use crate::model::Role;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Only customers check out, not a {0}")]
    NotCustomer(Role),

    #[error("Cart is empty")]
    EmptyCart,

    /// A cart change is still waiting on the server.
    #[error("Cart has unsettled changes")]
    CartNotSettled,

    #[error("No delivery location selected")]
    MissingLocation,

    #[error("Redirect carries no payment reference")]
    MissingReference,

    /// Another `begin` on this coordinator has not returned yet.
    #[error("A checkout is already being started")]
    CheckoutInProgress,

    #[error("No checkout is waiting to be resumed")]
    NoPendingCheckout,

    /// The gateway already assigned a reference to the pending payment. Verify it instead
    /// of starting a new one.
    #[error("Payment {0} is awaiting verification")]
    AwaitingVerification(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Checkout storage error: {0}")]
    Store(#[from] StoreError),
}
