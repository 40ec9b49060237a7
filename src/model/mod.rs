//! Plain data shared by every component: identifiers, cart lines, orders and actor statuses.
//!
//! All wire-facing types serialize with camelCase field names.

pub mod cart;
pub mod ids;
pub mod order;
pub mod status;

pub use cart::*;
pub use ids::*;
pub use order::*;
pub use status::*;
