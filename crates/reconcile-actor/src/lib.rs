//! # Reconcile Actor
//!
//! Building blocks for client-side state that mirrors an authoritative remote copy.
//! It keeps the **Actor Model** at its core (one task owns the state, messages arrive over a
//! channel, no locks) and adds what an optimistic client needs on top of it:
//!
//! - **Off-loop remote calls**: an entity hands the runtime a future; the runtime awaits it in a
//!   `JoinSet` and feeds the reply back, so the loop stays responsive while the network is slow.
//! - **Lanes**: commands on the same key are serialized, commands on different keys are not.
//!   A busy lane either queues or rejects newcomers.
//! - **Snapshots**: after every step the entity's view is published on a `watch` channel, so
//!   optimistic state is visible while a write is still in flight and a rollback is visible the
//!   moment it happens.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - the working copy and its reconciliation rules
//! 2. **Runtime Layer** ([`ResourceActor`]) - message loop, lanes, in-flight remote calls
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - commands and snapshots
//!
//! ## A Minimal Entity
//!
//! ```rust
//! use reconcile_actor::{ActorEntity, FrameworkError, Lane, ResourceActor, Step};
//!
//! #[derive(Debug, thiserror::Error)]
//! enum CounterError {
//!     #[error(transparent)]
//!     Framework(#[from] FrameworkError),
//! }
//!
//! #[derive(Default)]
//! struct Counter { value: u32 }
//!
//! #[derive(Debug)]
//! enum CounterCommand { Bump }
//!
//! impl ActorEntity for Counter {
//!     type Key = &'static str;
//!     type Command = CounterCommand;
//!     type Reply = u32;
//!     type Output = u32;
//!     type Error = CounterError;
//!     type Context = ();
//!     type Snapshot = u32;
//!
//!     fn lane(_: &CounterCommand) -> Lane<&'static str> { Lane::queue("counter") }
//!
//!     fn begin(&mut self, _: CounterCommand, _: &()) -> Step<Self> {
//!         self.value += 1; // optimistic
//!         let sent = self.value;
//!         Step::remote(async move { sent })
//!     }
//!
//!     fn resume(&mut self, confirmed: u32, _: &()) -> Step<Self> {
//!         self.value = confirmed;
//!         Step::ok(confirmed)
//!     }
//!
//!     fn snapshot(&self) -> u32 { self.value }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::new(8, Counter::default());
//!     tokio::spawn(actor.run(()));
//!     assert_eq!(client.send(CounterCommand::Bump).await.unwrap(), 1);
//!     assert_eq!(client.snapshot(), 1);
//! }
//! ```
//!
//! ## Testing
//!
//! The [`mock`] module provides a scripted [`MockClient`](mock::MockClient) so domain clients
//! can be tested without running an entity.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::{ActorEntity, BusyPolicy, Lane, RemoteCall, Step};
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
