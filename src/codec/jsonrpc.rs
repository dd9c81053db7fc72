//! JSON-RPC 2.0 codec for A2A protocol
//!
//! Task operations travel in JSON-RPC 2.0 envelopes posted to the agent's base
//! URL. The envelope types here are shared by the client codec and the agent
//! server so both sides agree on version marker, id echoing and error codes.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    codec::Codec,
    protocol::{error::A2AError, operation::A2AOperation},
    service::response::A2AResponse,
};

use super::json::JsonCodec;

/// JSON-RPC protocol version marker
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC and A2A error codes
pub mod error_codes {
    /// Body is not valid JSON
    pub const PARSE_ERROR: i64 = -32700;
    /// Envelope shape is wrong
    pub const INVALID_REQUEST: i64 = -32600;
    /// Unknown method
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Params do not match the method
    pub const INVALID_PARAMS: i64 = -32602;
    /// Anything else that went wrong on the server
    pub const INTERNAL_ERROR: i64 = -32603;
    /// `tasks/get` or `tasks/cancel` on an unknown task
    pub const TASK_NOT_FOUND: i64 = -32001;
    /// `tasks/cancel` on a terminal task
    pub const TASK_NOT_CANCELABLE: i64 = -32002;
    /// `tasks/send` with an id that is in flight or canceled
    pub const TASK_CONFLICT: i64 = -32010;
}

/// JSON-RPC request identifier
///
/// Ids are caller-chosen and echoed back unchanged. Strings are what this
/// crate sends; numbers are accepted from other clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(id) => f.write_str(id),
            RequestId::Number(id) => write!(f, "{}", id),
        }
    }
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Create a request envelope
    pub fn new(method: impl Into<String>, params: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response envelope
///
/// `id` is `null` only when the request could not be parsed far enough to
/// read its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create an error object
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Convert a wire error back into the typed error it was produced from
    ///
    /// `task_id` is used when the error data does not name the task.
    pub fn into_a2a_error(self, task_id: Option<&str>) -> A2AError {
        let field = |name: &str| {
            self.data
                .as_ref()
                .and_then(|data| data.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let task_id = field("taskId")
            .or_else(|| task_id.map(str::to_string))
            .unwrap_or_default();
        let status = field("status").unwrap_or_default();

        match self.code {
            error_codes::TASK_NOT_FOUND => A2AError::TaskNotFound { task_id },
            error_codes::TASK_NOT_CANCELABLE => A2AError::TaskNotCancelable { task_id, status },
            error_codes::TASK_CONFLICT => A2AError::TaskConflict { task_id, status },
            code => A2AError::Rpc {
                code,
                message: self.message,
            },
        }
    }
}

impl From<&A2AError> for JsonRpcError {
    fn from(err: &A2AError) -> Self {
        use error_codes::*;

        match err {
            A2AError::TaskNotFound { task_id } => JsonRpcError::new(TASK_NOT_FOUND, err.to_string())
                .with_data(json!({ "taskId": task_id })),
            A2AError::TaskNotCancelable { task_id, status } => {
                JsonRpcError::new(TASK_NOT_CANCELABLE, err.to_string())
                    .with_data(json!({ "taskId": task_id, "status": status }))
            }
            A2AError::TaskConflict { task_id, status } => {
                JsonRpcError::new(TASK_CONFLICT, err.to_string())
                    .with_data(json!({ "taskId": task_id, "status": status }))
            }
            A2AError::Validation(_) | A2AError::Serialization(_) => {
                JsonRpcError::new(INVALID_PARAMS, err.to_string())
            }
            A2AError::Rpc { code, message } => JsonRpcError::new(*code, message.clone()),
            _ => JsonRpcError::new(INTERNAL_ERROR, err.to_string()),
        }
    }
}

impl From<A2AError> for JsonRpcError {
    fn from(err: A2AError) -> Self {
        JsonRpcError::from(&err)
    }
}

/// JSON-RPC 2.0 codec that wraps A2A operations
///
/// Task operations are wrapped in request envelopes and their responses
/// unwrapped, checking that the response echoes the request id. Discovery
/// has no envelope and is handed straight to the inner JSON codec.
#[derive(Debug, Clone)]
pub struct JsonRpcCodec {
    /// Inner JSON codec for params and results
    inner: JsonCodec,
}

impl JsonRpcCodec {
    /// Create a new JSON-RPC codec
    pub fn new() -> Self {
        Self {
            inner: JsonCodec::new(),
        }
    }
}

impl Default for JsonRpcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JsonRpcCodec {
    fn encode_request(
        &self,
        operation: &A2AOperation,
        request_id: &str,
    ) -> Result<Bytes, A2AError> {
        let Some(method) = operation.rpc_method() else {
            return Ok(Bytes::new());
        };

        let request = JsonRpcRequest::new(
            method,
            self.inner.encode_params(operation)?,
            RequestId::from(request_id),
        );

        let bytes = serde_json::to_vec(&request)?;
        Ok(Bytes::from(bytes))
    }

    fn decode_response(
        &self,
        body: &[u8],
        operation: &A2AOperation,
        request_id: &str,
    ) -> Result<A2AResponse, A2AError> {
        if operation.rpc_method().is_none() {
            return self.inner.decode_card(body);
        }

        let response: JsonRpcResponse = serde_json::from_slice(body)
            .map_err(|e| A2AError::Transport(format!("Malformed JSON-RPC response: {}", e)))?;

        if response.jsonrpc != JSONRPC_VERSION {
            return Err(A2AError::Transport(format!(
                "Unsupported JSON-RPC version '{}'",
                response.jsonrpc
            )));
        }

        // Parse failures on the server cannot echo an id, so null is accepted for errors.
        match &response.id {
            Some(id) if *id == RequestId::from(request_id) => {}
            None if response.error.is_some() => {}
            other => {
                return Err(A2AError::Protocol(format!(
                    "Response id {:?} does not echo request id {}",
                    other, request_id
                )))
            }
        }

        if let Some(error) = response.error {
            return Err(error.into_a2a_error(operation.task_id()));
        }

        let result = response.result.ok_or_else(|| {
            A2AError::Protocol("JSON-RPC response missing 'result' field".to_string())
        })?;

        self.inner.decode_result(operation, result)
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}
