//! Order lifecycle: the actor-gated status machine shared by every dashboard.

pub mod entity;
pub mod error;
pub mod transitions;

pub use entity::*;
pub use error::*;

use crate::clients::OrderClient;
use reconcile_actor::ResourceActor;

/// Creates a new order actor and its client.
///
/// The actor's context carries a [`StatusClient`](crate::clients::StatusClient), so start the
/// status actor first.
pub fn new(buffer_size: usize) -> (ResourceActor<OrderBoard>, OrderClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, OrderBoard::new());
    (actor, OrderClient::new(generic_client))
}
