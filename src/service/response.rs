//! What the protocol service hands back

use crate::protocol::{agent::AgentCard, task::Task};

/// Decoded answer to an [`A2AOperation`](crate::protocol::A2AOperation)
#[derive(Debug, Clone)]
pub enum A2AResponse {
    /// Task snapshot from `tasks/send`, `tasks/get` or `tasks/cancel`
    Task(Box<Task>),

    /// Card fetched from the well-known path
    AgentCard(Box<AgentCard>),

    /// Nothing decodable came back (an empty card body); rejected by validation
    Empty,
}

impl A2AResponse {
    /// Extract a task from the response, if present
    pub fn into_task(self) -> Option<Task> {
        match self {
            A2AResponse::Task(task) => Some(*task),
            _ => None,
        }
    }

    /// Extract an agent card from the response, if present
    pub fn into_agent_card(self) -> Option<AgentCard> {
        match self {
            A2AResponse::AgentCard(card) => Some(*card),
            _ => None,
        }
    }

    /// Check if the response is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, A2AResponse::Empty)
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::message::Message;

    use super::*;

    #[test]
    fn test_response_task() {
        let task = Task::new("task-123", "s-1", Message::user("Test"));
        let response = A2AResponse::Task(Box::new(task));

        assert!(matches!(response, A2AResponse::Task(_)));

        let extracted = response.into_task();
        assert_eq!(extracted.unwrap().id, "task-123");
    }

    #[test]
    fn test_response_empty() {
        let response = A2AResponse::Empty;
        assert!(response.is_empty());
        assert!(response.into_agent_card().is_none());
    }
}
