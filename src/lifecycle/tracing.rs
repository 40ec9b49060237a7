//! # Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered by
//! `RUST_LOG`.
//!
//! ```bash
//! # Actor lifecycle, checkout milestones, lane conflicts and failures
//! RUST_LOG=info cargo run
//!
//! # Every command an actor receives, every client call, every sandbox request
//! RUST_LOG=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` the demo reads like this:
//!
//! ```text
//! INFO Actor started entity_type="CartState"
//! INFO Checkout initialized restaurant_id=1 total=1800 callback_id=...
//! INFO Payment verified, order placed order_id=1 reference="abc123"
//! WARN Lane busy, rejected entity_type="OrderBoard" lane=1
//! ```
//!
//! Domain clients open a span per call (`#[instrument(skip(self))]`), so a command and the
//! remote call it triggers share one line prefix.

/// Initializes the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
