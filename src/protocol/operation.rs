//! A2A protocol operations

use super::{
    agent::AGENT_CARD_PATH,
    task::{TaskIdParams, TaskQueryParams, TaskSendParams},
};

/// JSON-RPC method names exposed by a task manager
pub mod methods {
    /// Submit (or replay) a task
    pub const SEND_TASK: &str = "tasks/send";

    /// Fetch a task snapshot
    pub const GET_TASK: &str = "tasks/get";

    /// Cancel a non-terminal task
    pub const CANCEL_TASK: &str = "tasks/cancel";
}

/// A2A protocol operations
///
/// Each variant is binding-independent; the codec decides how it travels on
/// the wire. Task operations go through the JSON-RPC endpoint at the agent's
/// base URL, discovery is a plain GET of the Agent Card.
#[derive(Debug, Clone, PartialEq)]
pub enum A2AOperation {
    /// Submit a task (or replay a finished one)
    SendTask(TaskSendParams),

    /// Get a task by ID
    GetTask(TaskQueryParams),

    /// Cancel a task
    CancelTask(TaskIdParams),

    /// Discover agent capabilities (fetch Agent Card)
    DiscoverAgent,
}

impl A2AOperation {
    /// Get the endpoint path for this operation, relative to the agent's base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            A2AOperation::DiscoverAgent => AGENT_CARD_PATH,
            _ => "/",
        }
    }

    /// Get the HTTP method for this operation
    pub fn method(&self) -> &'static str {
        match self {
            A2AOperation::DiscoverAgent => "GET",
            _ => "POST",
        }
    }

    /// The JSON-RPC method name, if the operation is carried in an envelope
    pub fn rpc_method(&self) -> Option<&'static str> {
        match self {
            A2AOperation::SendTask(_) => Some(methods::SEND_TASK),
            A2AOperation::GetTask(_) => Some(methods::GET_TASK),
            A2AOperation::CancelTask(_) => Some(methods::CANCEL_TASK),
            A2AOperation::DiscoverAgent => None,
        }
    }

    /// The task this operation addresses, if any
    pub fn task_id(&self) -> Option<&str> {
        match self {
            A2AOperation::SendTask(params) => Some(&params.id),
            A2AOperation::GetTask(params) => Some(&params.id),
            A2AOperation::CancelTask(params) => Some(&params.id),
            A2AOperation::DiscoverAgent => None,
        }
    }
}
