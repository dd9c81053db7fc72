//! A2A task types and lifecycle management

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    error::{A2AError, TaskError},
    message::Message,
};

/// A task in the A2A protocol
///
/// Tasks are the unit of delegated work. A task is owned by the task manager
/// that created it; every other party only ever sees a cloned snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (caller supplied)
    pub id: String,

    /// Groups related tasks belonging to one conversation
    pub session_id: String,

    /// Current status of the task
    pub status: TaskStatus,

    /// Messages exchanged for this task, oldest first. Append-only.
    #[serde(default)]
    pub history: Vec<Message>,

    /// Agent output (present iff the task is completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Message>,

    /// Error information (present iff the task failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Caller supplied metadata, stored as received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Task {
    /// Create a new task in the `submitted` state with `message` as its first history entry
    pub fn new(id: impl Into<String>, session_id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            status: TaskStatus::Submitted,
            history: vec![message],
            result: None,
            error: None,
            created_at: Utc::now(),
            updated_at: None,
            metadata: None,
        }
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if the task is still processing
    pub fn is_processing(&self) -> bool {
        !self.is_terminal()
    }

    /// Move to `working`
    pub fn start(&mut self) -> Result<(), A2AError> {
        self.transition(TaskStatus::Working)
    }

    /// Move to `completed`, recording `output` as the result and appending it to history
    pub fn complete(&mut self, output: Message) -> Result<(), A2AError> {
        self.transition(TaskStatus::Completed)?;
        self.history.push(output.clone());
        self.result = Some(output);
        Ok(())
    }

    /// Move to `failed`, recording `error`
    pub fn fail(&mut self, error: TaskError) -> Result<(), A2AError> {
        self.transition(TaskStatus::Failed)?;
        self.error = Some(error);
        Ok(())
    }

    /// Move to `canceled`
    pub fn cancel(&mut self) -> Result<(), A2AError> {
        if self.is_terminal() {
            return Err(A2AError::TaskNotCancelable {
                task_id: self.id.clone(),
                status: self.status.to_string(),
            });
        }
        self.transition(TaskStatus::Canceled)
    }

    /// Set caller metadata
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// A snapshot whose history is trimmed to the most recent `length` messages
    pub fn with_history_length(mut self, length: Option<usize>) -> Self {
        if let Some(length) = length {
            let skip = self.history.len().saturating_sub(length);
            self.history.drain(..skip);
        }
        self
    }

    fn transition(&mut self, next: TaskStatus) -> Result<(), A2AError> {
        if !self.status.can_transition_to(next) {
            return Err(A2AError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}

/// Task status in the A2A protocol lifecycle
///
/// Task lifecycle: submitted → working → completed/failed/canceled.
/// A submitted task may also fail or be canceled before it starts working.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task has been accepted and not yet started
    Submitted,

    /// The agent's reasoning capability is running
    Working,

    /// Task completed successfully
    Completed,

    /// Task failed with an error
    Failed,

    /// Task was canceled by the client
    Canceled,
}

impl TaskStatus {
    /// Check if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Canceled
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;

        matches!(
            (self, next),
            (Submitted, Working)
                | (Submitted, Failed)
                | (Submitted, Canceled)
                | (Working, Completed)
                | (Working, Failed)
                | (Working, Canceled)
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Submitted => "submitted",
            TaskStatus::Working => "working",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of `tasks/send`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
    /// Task id, doubling as the idempotency key
    pub id: String,

    /// Session the task belongs to
    pub session_id: String,

    /// The instruction
    pub message: Message,

    /// Trim the returned history to this many messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,

    /// Optional caller metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl TaskSendParams {
    /// Create send parameters for a task
    pub fn new(id: impl Into<String>, session_id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            message,
            history_length: None,
            metadata: None,
        }
    }
}

/// Parameters of `tasks/get`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    /// Task id
    pub id: String,

    /// Trim the returned history to this many messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,
}

impl TaskQueryParams {
    /// Query a task by id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history_length: None,
        }
    }
}

/// Parameters of `tasks/cancel`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskIdParams {
    /// Task id
    pub id: String,
}

impl TaskIdParams {
    /// Address a task by id
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::message::Message;

    use super::*;

    fn task() -> Task {
        Task::new("task-123", "session-1", Message::user("Test"))
    }

    #[test]
    fn test_task_creation() {
        let task = task();

        assert_eq!(task.id, "task-123");
        assert_eq!(task.session_id, "session-1");
        assert_eq!(task.status, TaskStatus::Submitted);
        assert_eq!(task.history.len(), 1);
        assert!(!task.is_terminal());
        assert!(task.is_processing());
    }

    #[test]
    fn test_task_lifecycle() {
        let mut task = task();

        task.start().unwrap();
        assert_eq!(task.status, TaskStatus::Working);
        assert!(task.is_processing());

        task.complete(Message::agent("done")).unwrap();
        assert!(task.is_terminal());
        assert_eq!(task.result, Some(Message::agent("done")));
        assert_eq!(task.history.len(), 2);
        assert!(task.error.is_none());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut task = task();
        task.start().unwrap();
        task.fail(TaskError::new("reasoning_failed", "boom")).unwrap();

        assert!(matches!(
            task.complete(Message::agent("late")),
            Err(A2AError::InvalidTransition { .. })
        ));
        assert!(matches!(task.cancel(), Err(A2AError::TaskNotCancelable { .. })));
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.is_none());
        assert_eq!(task.history.len(), 1);
    }

    #[test]
    fn test_cannot_complete_before_working() {
        let mut task = task();
        assert!(task.complete(Message::agent("early")).is_err());
        assert!(task.result.is_none());
    }

    #[test]
    fn test_cancel_from_submitted() {
        let mut task = task();
        task.cancel().unwrap();
        assert_eq!(task.status, TaskStatus::Canceled);
        assert!(task.start().is_err());
    }

    #[test]
    fn test_history_length_keeps_most_recent() {
        let mut task = task();
        task.start().unwrap();
        task.complete(Message::agent("answer")).unwrap();

        let trimmed = task.clone().with_history_length(Some(1));
        assert_eq!(trimmed.history, vec![Message::agent("answer")]);

        let untouched = task.with_history_length(None);
        assert_eq!(untouched.history.len(), 2);
    }

    #[test]
    fn test_task_serialization() {
        let task = task();

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"id\":\"task-123\""));
        assert!(json.contains("\"sessionId\":\"session-1\""));
        assert!(json.contains("\"status\":\"submitted\""));

        let deserialized: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task, deserialized);
    }
}
