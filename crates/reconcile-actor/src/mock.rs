//! # Mock Framework
//!
//! Utilities for testing domain clients without running an entity.
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **State** | None, answers are scripted | Real working copy |
//! | **Use Case** | Logic *around* the client | The entity itself or the full system |
//! | **Error Injection** | `return_err` | Requires a failing remote |
//!
//! Two styles are available:
//!
//! - [`create_mock_client`] + [`expect_command`]: receive each request yourself and answer
//!   through its responder. Good when the test wants to inspect the command.
//! - [`MockClient`]: queue expected answers up front, then [`verify`](MockClient::verify).

use crate::entity::ActorEntity;
use crate::message::{ResourceRequest, Response};
use crate::ResourceClient;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

type Matcher<T> = Box<dyn Fn(&<T as ActorEntity>::Command) -> bool + Send>;

struct Expectation<T: ActorEntity> {
    matches: Option<Matcher<T>>,
    response: Result<T::Output, T::Error>,
}

/// A mock client with expectation tracking for fluent testing.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<CartState>::new(CartSnapshot::default());
/// mock.expect_command().return_ok(snapshot);
///
/// let cart = CartClient::new(mock.client());
/// // Use cart in tests...
/// mock.verify();
/// ```
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
    _snapshots: watch::Sender<T::Snapshot>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a mock whose client publishes `snapshot` and has no expectations.
    pub fn new(snapshot: T::Snapshot) -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let (snapshots, watcher) = watch::channel(snapshot);
        let expectations = Arc::new(Mutex::new(VecDeque::<Expectation<T>>::new()));
        let queued = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = queued.lock().unwrap().pop_front();
                let Some(expectation) = next else {
                    panic!("Unexpected command: {:?}", request.command);
                };
                if let Some(matches) = &expectation.matches {
                    assert!(
                        matches(&request.command),
                        "Command did not match expectation: {:?}",
                        request.command
                    );
                }
                let _ = request.respond_to.send(expectation.response);
            }
        });

        Self {
            client: ResourceClient::new(sender, watcher),
            expectations,
            _snapshots: snapshots,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects the next command, whatever it is.
    pub fn expect_command(&mut self) -> CommandExpectationBuilder<T> {
        CommandExpectationBuilder {
            matches: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects the next command to satisfy `matches`.
    pub fn expect_matching(
        &mut self,
        matches: impl Fn(&T::Command) -> bool + Send + 'static,
    ) -> CommandExpectationBuilder<T> {
        CommandExpectationBuilder {
            matches: Some(Box::new(matches)),
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        assert!(
            remaining == 0,
            "Not all expectations were met. {remaining} remaining"
        );
    }
}

/// Builder for command expectations.
pub struct CommandExpectationBuilder<T: ActorEntity> {
    matches: Option<Matcher<T>>,
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
}

impl<T: ActorEntity> CommandExpectationBuilder<T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, output: T::Output) {
        self.push(Ok(output));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: T::Error) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T::Output, T::Error>) {
        self.expectations.lock().unwrap().push_back(Expectation {
            matches: self.matches,
            response,
        });
    }
}

/// Creates a mock client and a receiver for asserting requests.
///
/// The client publishes `snapshot` forever; the test answers each command itself.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
    snapshot: T::Snapshot,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (_snapshots, watcher) = watch::channel(snapshot);
    (ResourceClient::new(sender, watcher), receiver)
}

/// Helper to take the next command and its responder.
pub async fn expect_command<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Command, Response<T>)> {
    receiver
        .recv()
        .await
        .map(|request| (request.command, request.respond_to))
}
