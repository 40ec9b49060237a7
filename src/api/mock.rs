//! # Scripted Transport
//!
//! [`MockTransport`] answers requests from a queue of expectations, in order, and records
//! what it was sent. Use it to test the JSON layer without a server.
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.expect(Method::Get, "/cart").respond(200, json!({ "items": [] }));
//!
//! let api = HttpApi::new(transport.clone(), Duration::from_secs(1));
//! api.view_cart(&session).await?;
//! transport.verify();
//! ```

use crate::api::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Expectation {
    method: Method,
    path: String,
    delay: Option<Duration>,
    outcome: Result<ApiResponse, TransportError>,
}

#[derive(Default)]
struct Script {
    expectations: VecDeque<Expectation>,
    requests: Vec<ApiRequest>,
}

/// A cloneable transport whose answers are queued up front.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the next request to be `method path`.
    pub fn expect(&self, method: Method, path: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            script: self.script.clone(),
            method,
            path: path.into(),
            delay: None,
        }
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.script.lock().unwrap().expectations.len();
        assert!(
            remaining == 0,
            "Not all expectations were met. {remaining} remaining"
        );
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let expectation = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(request.clone());
            script.expectations.pop_front()
        };
        let Some(expectation) = expectation else {
            panic!("Unexpected request: {:?} {}", request.method, request.path);
        };
        assert_eq!(
            (expectation.method, expectation.path.as_str()),
            (request.method, request.path.as_str()),
            "Request did not match expectation"
        );
        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }
        expectation.outcome
    }
}

/// Builder for transport expectations.
pub struct ExpectationBuilder {
    script: Arc<Mutex<Script>>,
    method: Method,
    path: String,
    delay: Option<Duration>,
}

impl ExpectationBuilder {
    /// Holds the answer back for `delay`.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, status: u16, body: Value) {
        self.push(Ok(ApiResponse { status, body }));
    }

    pub fn fail(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, outcome: Result<ApiResponse, TransportError>) {
        self.script.lock().unwrap().expectations.push_back(Expectation {
            method: self.method,
            path: self.path,
            delay: self.delay,
            outcome,
        });
    }
}
