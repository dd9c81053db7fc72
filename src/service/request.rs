//! A2A service request types

use std::{collections::HashMap, time::Duration};

use uuid::Uuid;

use crate::protocol::operation::A2AOperation;

/// A request to the A2A service
///
/// This wraps an A2A operation with additional context needed for execution
#[derive(Debug, Clone)]
pub struct A2ARequest {
    /// The A2A operation to execute
    pub operation: A2AOperation,

    /// Request context (request id, timeout, metadata)
    pub context: RequestContext,
}

impl A2ARequest {
    /// Create a new A2A request
    pub fn new(operation: A2AOperation, context: RequestContext) -> Self {
        Self { operation, context }
    }
}

/// Request context containing metadata and configuration
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// JSON-RPC request id the response must echo
    pub request_id: String,

    /// Per-request timeout; elapsing is a transport failure
    pub timeout: Option<Duration>,

    /// Additional metadata headers
    pub metadata: HashMap<String, String>,
}

impl RequestContext {
    /// Create a new request context with a fresh request id
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            timeout: Some(Duration::from_secs(30)),
            metadata: HashMap::new(),
        }
    }

    /// Use a specific request id
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a metadata header
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
