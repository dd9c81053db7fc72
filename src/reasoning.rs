//! The reasoning capability an agent serves
//!
//! A task manager hands each new task to a [`ReasoningCapability`]. What sits
//! behind it (an LLM with tools, a rules engine, another orchestrator) is the
//! agent's business; the task manager only sees text in, output or error out.

use std::future::Future;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::Message;

/// Input to one reasoning invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    /// Task being processed
    pub task_id: String,

    /// Session the task belongs to
    pub session_id: String,

    /// Instruction text (all text parts of the incoming message, joined)
    pub instruction: String,

    /// Structured context (the first data part of the incoming message)
    pub context: Option<Map<String, Value>>,
}

impl ReasoningRequest {
    /// Build a request from an incoming task message
    pub fn from_message(
        task_id: impl Into<String>,
        session_id: impl Into<String>,
        message: &Message,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            session_id: session_id.into(),
            instruction: message.text_content(),
            context: message.data().cloned(),
        }
    }
}

/// Output of a successful reasoning invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ReasoningOutput {
    /// Free text answer
    Text(String),

    /// Structured answer (e.g. `{"mixer_state": "idle"}`)
    Data(Map<String, Value>),
}

impl ReasoningOutput {
    /// Interpret raw model text: a JSON object becomes `Data`, anything else stays `Text`
    pub fn infer(text: impl Into<String>) -> Self {
        let text = text.into();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(map)) => ReasoningOutput::Data(map),
            _ => ReasoningOutput::Text(text),
        }
    }

    /// Whether there is nothing usable in the output
    pub fn is_empty(&self) -> bool {
        match self {
            ReasoningOutput::Text(text) => text.trim().is_empty(),
            ReasoningOutput::Data(data) => data.is_empty(),
        }
    }

    /// Wrap the output as the agent's result message
    pub fn into_message(self) -> Message {
        match self {
            ReasoningOutput::Text(text) => Message::agent(text),
            ReasoningOutput::Data(data) => Message::agent_data(data),
        }
    }
}

/// Error raised by a reasoning capability
///
/// Never crosses the wire as an error: the task manager records it as the
/// task's failure reason.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReasoningError {
    /// The capability could not satisfy the instruction
    #[error("{0}")]
    Failed(String),

    /// A backing tool or service was unavailable
    #[error("{tool} unavailable: {message}")]
    ToolUnavailable { tool: String, message: String },
}

impl ReasoningError {
    /// Shorthand for [`ReasoningError::Failed`]
    pub fn failed(message: impl Into<String>) -> Self {
        ReasoningError::Failed(message.into())
    }
}

/// The agent's reasoning capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningCapability: Send + Sync {
    /// Process one instruction
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningOutput, ReasoningError>;
}

/// Reasoning capability backed by an async closure
#[derive(Clone)]
pub struct FnReasoning<F> {
    f: F,
}

/// Build a [`ReasoningCapability`] from an async closure
///
/// # Example
///
/// ```rust
/// use tower_a2a_delegate::reasoning::{from_fn, ReasoningOutput};
///
/// let echo = from_fn(|request| async move {
///     Ok(ReasoningOutput::Text(request.instruction))
/// });
/// # let _ = echo;
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnReasoning<F>
where
    F: Fn(ReasoningRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ReasoningOutput, ReasoningError>> + Send,
{
    FnReasoning { f }
}

#[async_trait]
impl<F, Fut> ReasoningCapability for FnReasoning<F>
where
    F: Fn(ReasoningRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ReasoningOutput, ReasoningError>> + Send,
{
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningOutput, ReasoningError> {
        (self.f)(request).await
    }
}

impl<F> std::fmt::Debug for FnReasoning<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnReasoning").finish()
    }
}
