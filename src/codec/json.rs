//! JSON payload codec
//!
//! Encodes operation params and decodes results. Used inside the JSON-RPC
//! envelope for task operations and directly for the Agent Card document.

use serde_json::Value;

use crate::{
    protocol::{agent::AgentCard, error::A2AError, operation::A2AOperation, task::Task},
    service::response::A2AResponse,
};

/// JSON codec for A2A params, results and Agent Card documents
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec
    pub fn new() -> Self {
        Self
    }

    /// Serialize the params of a task operation
    pub fn encode_params(&self, operation: &A2AOperation) -> Result<Value, A2AError> {
        let params = match operation {
            A2AOperation::SendTask(params) => serde_json::to_value(params)?,
            A2AOperation::GetTask(params) => serde_json::to_value(params)?,
            A2AOperation::CancelTask(params) => serde_json::to_value(params)?,
            A2AOperation::DiscoverAgent => Value::Null,
        };
        Ok(params)
    }

    /// Deserialize the result of a task operation
    pub fn decode_result(
        &self,
        operation: &A2AOperation,
        result: Value,
    ) -> Result<A2AResponse, A2AError> {
        match operation {
            A2AOperation::SendTask(_) | A2AOperation::GetTask(_) | A2AOperation::CancelTask(_) => {
                let task: Task = serde_json::from_value(result)?;
                Ok(A2AResponse::Task(Box::new(task)))
            }
            A2AOperation::DiscoverAgent => {
                let body = serde_json::to_vec(&result)?;
                self.decode_card(&body)
            }
        }
    }

    /// Deserialize an Agent Card document
    pub fn decode_card(&self, body: &[u8]) -> Result<A2AResponse, A2AError> {
        if body.is_empty() {
            return Ok(A2AResponse::Empty);
        }
        let card = AgentCard::from_discovery_bytes(body)?;
        Ok(A2AResponse::AgentCard(Box::new(card)))
    }
}
