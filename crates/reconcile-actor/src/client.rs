//! # Generic Client
//!
//! The sending half of a `ResourceActor`: commands go in over an mpsc channel, results come
//! back on a oneshot, and the latest snapshot is always readable without a round trip.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use tokio::sync::{mpsc, oneshot, watch};

/// ## ResourceClient
///
/// A type-safe, cloneable handle to a `ResourceActor<T>`.
///
/// * **Commands** – [`send`](ResourceClient::send) resolves once the command reaches
///   `Step::Done`, including any remote round trips and reconciliation.
/// * **Snapshots** – [`snapshot`](ResourceClient::snapshot) reads the last published view,
///   which includes optimistic state while a command is still in flight.
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    snapshots: watch::Receiver<T::Snapshot>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(
        sender: mpsc::Sender<ResourceRequest<T>>,
        snapshots: watch::Receiver<T::Snapshot>,
    ) -> Self {
        Self { sender, snapshots }
    }

    pub async fn send(&self, command: T::Command) -> Result<T::Output, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest {
                command,
                respond_to,
            })
            .await
            .map_err(|_| T::Error::from(FrameworkError::ActorClosed))?;
        response
            .await
            .map_err(|_| T::Error::from(FrameworkError::ActorDropped))?
    }

    pub fn snapshot(&self) -> T::Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T::Snapshot> {
        self.snapshots.clone()
    }
}
