//! # Food Order Engine
//!
//! The client-side engine of a food-ordering platform: a customer's cart, the checkout
//! that leaves for a payment gateway and comes back, the order lifecycle that restaurants,
//! drivers and admins push forward, and the availability toggles of drivers and restaurants.
//!
//! None of it renders anything. Views read snapshots and send commands.
//!
//! ## Architecture
//!
//! Three components are actors on the [`reconcile_actor`] runtime. Each owns its state,
//! applies optimistic changes the moment a command arrives, and reconciles with the server
//! when the remote call settles:
//!
//! | Actor | Entity | Lane per | When busy |
//! |-------|--------|----------|-----------|
//! | [`cart_actor`] | [`CartState`](cart_actor::CartState) | menu item | queue |
//! | [`status_actor`] | [`StatusBoard`](status_actor::StatusBoard) | driver or restaurant | queue |
//! | [`order_actor`] | [`OrderBoard`](order_actor::OrderBoard) | order | reject |
//!
//! The [`checkout`] coordinator is not an actor: its state has to outlive the process
//! across the payment redirect, so it lives in a [`store::KeyValueStore`].
//!
//! ## Module Tour
//!
//! - [`model`]: ids, menu and cart items, orders, statuses, roles.
//! - [`api`]: the [`OrderingApi`](api::OrderingApi) contract, its JSON implementation and
//!   the error taxonomy.
//! - [`clients`]: typed wrappers over each actor's `ResourceClient`.
//! - [`lifecycle`]: [`OrderingSystem`](lifecycle::OrderingSystem) wires everything for one
//!   session; [`setup_tracing`](lifecycle::setup_tracing) sets up logging.
//! - [`config`]: [`EngineConfig`](config::EngineConfig) from the environment.
//! - `sandbox`: an in-memory backend for the demo and the tests, behind the `sandbox`
//!   feature (on by default). Build with `default-features = false` to leave it out.
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod api;
pub mod cart_actor;
pub mod checkout;
pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
#[cfg(any(test, feature = "sandbox"))]
pub mod sandbox;
pub mod status_actor;
pub mod store;
