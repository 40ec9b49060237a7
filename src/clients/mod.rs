//! Type-safe wrappers around [`ResourceClient`](reconcile_actor::ResourceClient), one per
//! component.

pub mod cart_client;
pub mod order_client;
pub mod status_client;

pub use cart_client::*;
pub use order_client::*;
pub use status_client::*;
