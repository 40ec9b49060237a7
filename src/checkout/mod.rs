//! Checkout: the payment handoff and the state that survives it.

pub mod coordinator;
pub mod error;
pub mod persisted;

pub use coordinator::*;
pub use error::*;
pub use persisted::*;
