//! Error types for A2A protocol operations

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for A2A protocol operations
///
/// Variants fall into three families that callers are expected to treat
/// differently:
///
/// - connectivity: [`A2AError::Transport`]. The remote agent could not be
///   reached or did not answer with a well-formed envelope. Safe to retry.
///   [`A2AError::Unreachable`] is the orchestrator's record of a registered
///   agent that failed discovery and so was never asked.
/// - business: [`A2AError::TaskNotFound`], [`A2AError::TaskConflict`],
///   [`A2AError::TaskNotCancelable`], [`A2AError::TaskFailed`],
///   [`A2AError::TaskCanceled`], [`A2AError::Rpc`]. The agent answered;
///   retrying the same request will not change the answer.
/// - deadline: [`A2AError::Timeout`]. The caller stopped waiting; the remote
///   task may still complete later.
#[derive(Debug, Error)]
pub enum A2AError {
    /// Transport-level error (connection refused, DNS, request timeout, malformed envelope)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error (mismatched request id, unexpected payload)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Validation error (invalid request or response)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Agent card is missing required fields or violates card invariants
    #[error("Invalid agent card: {0}")]
    InvalidAgentCard(String),

    /// Configuration could not be loaded (missing or malformed registry file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// JSON-RPC error returned by the remote agent that has no dedicated variant
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Task not found error
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// A task with this id already exists and may not be (re)submitted
    #[error("Task {task_id} conflicts with an existing {status} task")]
    TaskConflict { task_id: String, status: String },

    /// Cancellation requested for a task that already reached a terminal state
    #[error("Task {task_id} cannot be canceled in state {status}")]
    TaskNotCancelable { task_id: String, status: String },

    /// Attempted state transition that the task lifecycle forbids
    #[error("Invalid task transition for {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: String,
        to: String,
    },

    /// The remote agent finished the task in the failed state
    #[error("Task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    /// The remote agent finished the task in the canceled state
    #[error("Task {task_id} was canceled")]
    TaskCanceled { task_id: String },

    /// A registered agent did not serve a usable card when the roster was built
    #[error("Agent at {endpoint} is unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// Gave up waiting for a task to reach a terminal state
    #[error("Timed out after {elapsed:?} waiting for task {task_id}")]
    Timeout { task_id: String, elapsed: Duration },
}

impl A2AError {
    /// Whether this error is a connectivity failure rather than an answer from the agent
    pub fn is_transport(&self) -> bool {
        matches!(self, A2AError::Transport(_))
    }

    /// Whether this error is a caller-side deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, A2AError::Timeout { .. })
    }

    /// Short machine-readable classification used in orchestration reports
    pub fn kind(&self) -> &'static str {
        match self {
            A2AError::Transport(_) => "transport",
            A2AError::Timeout { .. } => "timeout",
            A2AError::Unreachable { .. } => "unreachable",
            A2AError::TaskFailed { .. } => "failed",
            A2AError::TaskCanceled { .. } => "canceled",
            A2AError::TaskNotFound { .. } => "not_found",
            A2AError::TaskConflict { .. } => "conflict",
            A2AError::TaskNotCancelable { .. } => "not_cancelable",
            A2AError::InvalidAgentCard(_) => "invalid_agent_card",
            A2AError::Validation(_) => "validation",
            A2AError::Config(_) => "config",
            A2AError::InvalidTransition { .. } => "invalid_transition",
            A2AError::Protocol(_) | A2AError::Serialization(_) | A2AError::Rpc { .. } => {
                "protocol"
            }
        }
    }
}

/// Task-specific error with structured information
///
/// Recorded on a task that ends in the `failed` state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct TaskError {
    /// Error code (e.g., "reasoning_failed", "reasoning_timeout")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Additional error details as structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TaskError {
    /// Create a new task error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the task error
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result type alias for A2A operations
pub type A2AResult<T> = Result<T, A2AError>;

impl From<reqwest::Error> for A2AError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            A2AError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            A2AError::Transport(format!("Connection error: {}", err))
        } else {
            A2AError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_is_distinct_from_business_errors() {
        assert!(A2AError::Transport("refused".into()).is_transport());
        assert!(!A2AError::TaskNotFound {
            task_id: "t".into()
        }
        .is_transport());
        assert!(!A2AError::TaskFailed {
            task_id: "t".into(),
            reason: "boom".into()
        }
        .is_transport());
    }

    #[test]
    fn test_timeout_kind() {
        let err = A2AError::Timeout {
            task_id: "t-1".into(),
            elapsed: Duration::from_secs(2),
        };
        assert!(err.is_timeout());
        assert_eq!(err.kind(), "timeout");
        assert!(err.to_string().contains("t-1"));
    }

    #[test]
    fn test_task_error_details() {
        let err = TaskError::new("reasoning_failed", "no data")
            .with_details(serde_json::json!({"source": "opcua"}));
        assert_eq!(err.to_string(), "no data");
        assert!(err.details.is_some());
    }
}
