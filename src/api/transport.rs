//! The HTTP client seam.
//!
//! Sending bytes over the wire is someone else's job; this module only fixes the shape
//! of a request and a response so [`HttpApi`](crate::api::HttpApi) can speak JSON to any
//! client that implements [`Transport`].

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path plus query, relative to the API base URL.
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
