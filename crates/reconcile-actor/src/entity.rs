//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract a piece of client-side state implements to be
//! driven by a [`ResourceActor`](crate::ResourceActor). The entity holds a *working copy*
//! of state whose authoritative version lives on a remote server, and describes every
//! mutation as a small state machine:
//!
//! 1. [`begin`](ActorEntity::begin) applies the local effect (often optimistic) and either
//!    finishes immediately or hands back a remote call.
//! 2. The runtime awaits the remote call *off* the actor loop, so other lanes keep moving.
//! 3. [`resume`](ActorEntity::resume) reconciles the reply with local state. It may finish,
//!    or chain another remote call (for example a refetch after a failed write).
//!
//! # Lanes
//! Each command names a [`Lane`]. Commands on the same keyed lane never overlap: while one
//! is between `begin` and its final `Done`, later commands for that key are queued or
//! rejected according to the lane's [`BusyPolicy`]. Commands on different lanes, and
//! commands on [`Lane::Free`], have no ordering between them.
//!
//! # Context
//! As in the rest of the framework, dependencies (API handles, other clients) are injected
//! through `Context` when the actor is run, not when it is built.

use crate::error::FrameworkError;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;

/// A remote call handed to the runtime. It must own everything it touches.
pub type RemoteCall<R> = Pin<Box<dyn Future<Output = R> + Send + 'static>>;

/// What to do when a keyed lane already has a command in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyPolicy {
    /// Hold the command until the lane is released, then run it.
    Queue,
    /// Answer immediately with [`FrameworkError::LaneBusy`].
    Reject,
}

/// The serialization lane a command belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lane<K> {
    Keyed { key: K, when_busy: BusyPolicy },
    Free,
}

impl<K> Lane<K> {
    pub fn queue(key: K) -> Self {
        Lane::Keyed {
            key,
            when_busy: BusyPolicy::Queue,
        }
    }

    pub fn reject(key: K) -> Self {
        Lane::Keyed {
            key,
            when_busy: BusyPolicy::Reject,
        }
    }
}

/// Outcome of `begin` or `resume`.
pub enum Step<T: ActorEntity> {
    /// The command is finished; the result goes back to the caller and the lane is released.
    Done(Result<T::Output, T::Error>),
    /// Await this call, then feed its reply to [`ActorEntity::resume`].
    Remote(RemoteCall<T::Reply>),
}

impl<T: ActorEntity> Step<T> {
    pub fn ok(output: T::Output) -> Self {
        Step::Done(Ok(output))
    }

    pub fn err(error: impl Into<T::Error>) -> Self {
        Step::Done(Err(error.into()))
    }

    pub fn remote<F>(call: F) -> Self
    where
        F: Future<Output = T::Reply> + Send + 'static,
    {
        Step::Remote(Box::pin(call))
    }
}

impl<T: ActorEntity> Debug for Step<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Done(Ok(output)) => f.debug_tuple("Done").field(output).finish(),
            Step::Done(Err(e)) => f.debug_tuple("Failed").field(e).finish(),
            Step::Remote(_) => f.write_str("Remote"),
        }
    }
}

/// Trait that any reconciled entity must implement to be managed by `ResourceActor`.
///
/// The entity is owned exclusively by its actor task, so none of these methods need locks.
/// They are synchronous on purpose: all waiting happens in the [`RemoteCall`]s they return.
pub trait ActorEntity: Sized + Send + 'static {
    /// Key of a serialization lane (e.g. a menu item id, an order id).
    type Key: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// Commands accepted by the entity.
    type Command: Send + Debug + 'static;

    /// Result of a remote call, fed back into `resume`. It must carry whatever the
    /// entity needs to know which command it belongs to.
    type Reply: Send + 'static;

    /// Value returned to the caller when a command finishes.
    type Output: Send + Debug + 'static;

    /// Per-entity error enum. Runtime failures are folded in through `From<FrameworkError>`.
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    /// Dependencies injected when the actor is run. Use `()` if none are needed.
    type Context: Send + Sync + 'static;

    /// The view published to subscribers after every step.
    type Snapshot: Clone + Send + Sync + 'static;

    /// Which lane a command runs on.
    fn lane(command: &Self::Command) -> Lane<Self::Key>;

    /// Apply a command's local effect.
    fn begin(&mut self, command: Self::Command, ctx: &Self::Context) -> Step<Self>;

    /// Reconcile a remote reply.
    fn resume(&mut self, reply: Self::Reply, ctx: &Self::Context) -> Step<Self>;

    /// Current view of the working copy.
    fn snapshot(&self) -> Self::Snapshot;
}
