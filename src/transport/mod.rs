//! Byte transport between the protocol service and a remote agent

pub mod http;
#[cfg(test)]
pub mod mock;

use std::{
    collections::HashMap,
    task::{Context, Poll},
};

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::protocol::error::A2AError;

/// One outbound exchange, relative to the agent's base URL
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The endpoint path relative to the agent's base URL (e.g., "/", "/.well-known/agent.json")
    pub endpoint: String,

    /// `POST` for the task endpoint, `GET` for the card
    pub method: String,

    /// Request headers (content type, caller metadata)
    pub headers: HashMap<String, String>,

    /// Request body as bytes
    pub body: Bytes,
}

impl TransportRequest {
    /// Create a new transport request
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header to the request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }
}

/// What came back, undecoded
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status
    pub status: u16,

    /// Response headers
    pub headers: HashMap<String, String>,

    /// Response body as bytes
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a new transport response
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Set the response body
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Check if the response indicates success (2xx status code)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Core transport trait for executing protocol-agnostic requests
///
/// Implementations only move bytes. Anything that prevents a response from
/// arriving (refused connection, DNS failure, I/O error) must be reported as
/// [`A2AError::Transport`] so callers can tell it apart from an agent's answer.
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Readiness, forwarded from the protocol service's `poll_ready`
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), A2AError>>;

    /// Execute a transport request asynchronously
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError>;

    /// Get the base URL of the agent this transport talks to
    fn base_url(&self) -> &Url;
}
