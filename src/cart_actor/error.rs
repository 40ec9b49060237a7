//! Error types for the cart actor.

use crate::api::ApiError;
use crate::model::{MenuItemId, RestaurantId, Role};
use reconcile_actor::FrameworkError;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    /// Cart calls are only issued for a signed-in session.
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Only customers have a cart, not a {0}")]
    NotCustomer(Role),

    /// A cart holds items from one restaurant at a time.
    #[error("Cart holds items from {current}; cannot add from {requested}")]
    DifferentRestaurant {
        current: RestaurantId,
        requested: RestaurantId,
    },

    #[error("{0} is not in the cart")]
    NotInCart(MenuItemId),

    /// The server refused the change or could not be reached. The cart has already been
    /// rolled back or resynchronized.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    Framework(#[from] FrameworkError),
}
