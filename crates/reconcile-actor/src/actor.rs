//! # Generic Actor Server
//!
//! `ResourceActor` owns one entity and drives every command through the entity's
//! `begin`/`resume` state machine. Remote calls are spawned into a `JoinSet` so a slow
//! server never blocks the loop; their replies come back into the same loop, which keeps
//! the entity single-owner and lock-free.

use crate::client::ResourceClient;
use crate::entity::{ActorEntity, BusyPolicy, Lane, Step};
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Response};
use std::collections::{HashMap, VecDeque};
use tokio::sync::{mpsc, watch};
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// A remote call that has finished, on its way back into the loop.
struct Completion<T: ActorEntity> {
    reply: T::Reply,
    respond_to: Response<T>,
}

/// The generic actor that owns an entity's working copy.
///
/// # Concurrency Model
/// The entity is touched only from the loop in [`run`](ResourceActor::run). Remote calls run
/// concurrently in spawned tasks, but their replies are applied one at a time.
///
/// A keyed lane is *busy* from the moment a command for that key enters `begin` until the
/// entity returns `Step::Done` for it, however many remote round trips that takes. The
/// `busy` map holds, per busy key, the commands waiting behind it. `lanes` maps each
/// in-flight task to the key it holds, so a task that panics still frees its lane.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceActor::new(buffer, entity)` returns the actor and its client.
/// 2.  **Wire**: pass dependencies into `actor.run(context)`.
/// 3.  **Run**: spawn the run loop.
///
/// The loop ends once every client is dropped and no remote call is in flight.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    entity: T,
    snapshots: watch::Sender<T::Snapshot>,
    busy: HashMap<T::Key, VecDeque<ResourceRequest<T>>>,
    in_flight: JoinSet<Completion<T>>,
    lanes: HashMap<Id, T::Key>,
    entity_type: &'static str,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` around `entity` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full, client calls
    /// wait for space.
    pub fn new(buffer_size: usize, entity: T) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (snapshots, watcher) = watch::channel(entity.snapshot());
        // Just the type name, e.g. "CartState" rather than the full path.
        let entity_type = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown");
        let actor = Self {
            receiver,
            entity,
            snapshots,
            busy: HashMap::new(),
            in_flight: JoinSet::new(),
            lanes: HashMap::new(),
            entity_type,
        };
        (actor, ResourceClient::new(sender, watcher))
    }

    /// Runs the actor's event loop.
    ///
    /// # Context Injection
    /// `context` is passed to every `begin`/`resume` call, so entities can reach
    /// dependencies that were created after the actor itself.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = self.entity_type;
        info!(entity_type, "Actor started");

        let mut accepting = true;
        loop {
            tokio::select! {
                request = self.receiver.recv(), if accepting => match request {
                    Some(request) => self.dispatch(request, &context),
                    None => accepting = false,
                },
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok((id, completion)) => self.complete(id, completion, &context),
                        Err(e) => self.abandon(e, &context),
                    }
                }
                else => break,
            }
        }

        info!(entity_type, "Shutdown");
    }

    fn dispatch(&mut self, request: ResourceRequest<T>, ctx: &T::Context) {
        let entity_type = self.entity_type;
        match T::lane(&request.command) {
            Lane::Free => self.start(None, request, ctx),
            Lane::Keyed { key, when_busy } => {
                if let Some(waiting) = self.busy.get_mut(&key) {
                    match when_busy {
                        BusyPolicy::Queue => {
                            waiting.push_back(request);
                            debug!(entity_type, lane = %key, waiting = waiting.len(), "Lane busy, queued");
                        }
                        BusyPolicy::Reject => {
                            warn!(entity_type, lane = %key, "Lane busy, rejected");
                            let error = FrameworkError::LaneBusy(key.to_string());
                            let _ = request.respond_to.send(Err(error.into()));
                        }
                    }
                    return;
                }
                self.busy.insert(key.clone(), VecDeque::new());
                self.start(Some(key), request, ctx);
            }
        }
    }

    fn start(&mut self, lane: Option<T::Key>, request: ResourceRequest<T>, ctx: &T::Context) {
        let ResourceRequest {
            command,
            respond_to,
        } = request;
        debug!(entity_type = self.entity_type, ?command, "Command");
        let step = self.entity.begin(command, ctx);
        self.advance(lane, step, respond_to, ctx);
    }

    fn complete(&mut self, id: Id, completion: Completion<T>, ctx: &T::Context) {
        let Completion { reply, respond_to } = completion;
        let lane = self.lanes.remove(&id);
        let step = self.entity.resume(reply, ctx);
        self.advance(lane, step, respond_to, ctx);
    }

    fn advance(
        &mut self,
        lane: Option<T::Key>,
        step: Step<T>,
        respond_to: Response<T>,
        ctx: &T::Context,
    ) {
        self.snapshots.send_replace(self.entity.snapshot());
        match step {
            Step::Remote(call) => {
                let task = self.in_flight.spawn(async move {
                    let reply = call.await;
                    Completion { reply, respond_to }
                });
                if let Some(key) = lane {
                    self.lanes.insert(task.id(), key);
                }
            }
            Step::Done(result) => {
                let entity_type = self.entity_type;
                match &result {
                    Ok(_) => debug!(entity_type, "Command ok"),
                    Err(e) => warn!(entity_type, error = %e, "Command failed"),
                }
                let _ = respond_to.send(result);
                if let Some(key) = lane {
                    self.release(key, ctx);
                }
            }
        }
    }

    /// A remote call panicked or was cancelled. Its responder went down with the task, so the
    /// caller sees `ActorDropped`; the lane it held moves on to the next queued command.
    fn abandon(&mut self, e: JoinError, ctx: &T::Context) {
        let lane = self.lanes.remove(&e.id());
        match &lane {
            Some(key) => error!(entity_type = self.entity_type, lane = %key, error = %e, "Remote call aborted"),
            None => error!(entity_type = self.entity_type, error = %e, "Remote call aborted"),
        }
        if let Some(key) = lane {
            self.release(key, ctx);
        }
    }

    /// Start the next queued command on `key`, or mark the lane idle.
    fn release(&mut self, key: T::Key, ctx: &T::Context) {
        match self.busy.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(next) => self.start(Some(key), next, ctx),
            None => {
                self.busy.remove(&key);
            }
        }
    }
}
