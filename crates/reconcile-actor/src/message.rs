//! # Generic Messages
//!
//! The request type carried from a `ResourceClient` to its `ResourceActor`.

use crate::entity::ActorEntity;
use std::fmt;
use tokio::sync::oneshot;

/// One-shot response channel used by actors. The entity's own error type is
/// carried end to end.
pub type Response<T> =
    oneshot::Sender<Result<<T as ActorEntity>::Output, <T as ActorEntity>::Error>>;

/// A command sent to the actor together with the channel its result goes back on.
///
/// The runtime does not interpret the command; it only asks the entity which
/// [`Lane`](crate::Lane) it belongs to and then drives it through
/// [`ActorEntity::begin`] and [`ActorEntity::resume`].
pub struct ResourceRequest<T: ActorEntity> {
    pub command: T::Command,
    pub respond_to: Response<T>,
}

impl<T: ActorEntity> fmt::Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRequest")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}
