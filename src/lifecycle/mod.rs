//! Starting, wiring and stopping the engine's actors.
//!
//! - [`OrderingSystem`] starts the cart, status and order actors for one session, injects
//!   each actor's context and builds the checkout coordinator on top of their clients.
//! - [`setup_tracing`] initializes logging.

pub mod ordering_system;
pub mod tracing;

pub use ordering_system::*;
pub use tracing::*;
