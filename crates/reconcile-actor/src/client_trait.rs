//! # ActorClient Trait
//!
//! Common surface for domain clients that wrap a `ResourceClient`.
use crate::{ActorEntity, ResourceClient};
use tokio::sync::watch;

/// Trait for domain clients to inherit snapshot access.
///
/// Implementors only provide [`inner`](ActorClient::inner); reading and subscribing to the
/// published view come for free, so every surface observes state the same way.
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Latest published view.
    fn snapshot(&self) -> T::Snapshot {
        self.inner().snapshot()
    }

    /// Watch for every view the actor publishes from now on.
    fn subscribe(&self) -> watch::Receiver<T::Snapshot> {
        self.inner().subscribe()
    }
}
