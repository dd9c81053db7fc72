//! A2A message types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message in the A2A protocol
///
/// Messages are the unit exchanged in both directions of a task: the caller
/// sends a `user` message, the agent answers with an `agent` message. Each
/// message carries one or more parts (text or structured data).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Message content parts (at least one required)
    pub parts: Vec<Part>,

    /// Optional metadata for the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Message {
    /// Create a new message with text content
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an agent message with text content
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    /// Create an agent message carrying a single structured data part
    pub fn agent_data(data: Map<String, Value>) -> Self {
        Self {
            role: Role::Agent,
            parts: vec![Part::Data { data }],
            metadata: None,
        }
    }

    /// Add a message part
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Add a metadata field to the message
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// All text parts joined by newlines
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The first structured data part, if any
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.parts.iter().find_map(Part::as_data)
    }

    /// Whether the message carries anything a reader could use
    pub fn is_blank(&self) -> bool {
        self.parts.iter().all(|part| match part {
            Part::Text { text } => text.trim().is_empty(),
            Part::Data { data } => data.is_empty(),
        })
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from a user or a delegating agent
    User,

    /// Message from the agent performing the task
    Agent,
}

/// A part of a message
///
/// Serialized as an internally tagged object: `{"type": "text", "text": ..}`
/// or `{"type": "data", "data": {..}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
    },

    /// Structured key/value data
    Data {
        /// The structured data
        data: Map<String, Value>,
    },
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a data part
    pub fn data(data: Map<String, Value>) -> Self {
        Self::Data { data }
    }

    /// Borrow the text of a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Data { .. } => None,
        }
    }

    /// Borrow the mapping of a data part
    pub fn as_data(&self) -> Option<&Map<String, Value>> {
        match self {
            Part::Data { data } => Some(data),
            Part::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts.len(), 1);

        match &msg.parts[0] {
            Part::Text { text } => assert_eq!(text, "Hello, agent!"),
            _ => panic!("Expected text part"),
        }
    }

    #[test]
    fn test_text_content_joins_text_parts_only() {
        let msg = Message::user("first")
            .with_part(Part::data(object(json!({"batches": 4}))))
            .with_part(Part::text("second"));

        assert_eq!(msg.text_content(), "first\nsecond");
        assert_eq!(msg.data().and_then(|d| d.get("batches")), Some(&json!(4)));
    }

    #[test]
    fn test_part_is_tagged() {
        let json = serde_json::to_value(Part::text("hi")).unwrap();
        assert_eq!(json, json!({"type": "text", "text": "hi"}));

        let json = serde_json::to_value(Part::data(object(json!({"k": "v"})))).unwrap();
        assert_eq!(json, json!({"type": "data", "data": {"k": "v"}}));
    }

    #[test]
    fn test_data_part_must_be_object() {
        let result: Result<Part, _> = serde_json::from_value(json!({"type": "data", "data": 5}));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_message() {
        assert!(Message::agent("   ").is_blank());
        assert!(Message::agent_data(Map::new()).is_blank());
        assert!(!Message::agent_data(object(json!({"mixer_state": "running"}))).is_blank());
    }

    #[test]
    fn test_message_with_metadata() {
        let msg = Message::user("Test").with_metadata("source", json!("orchestrator"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["metadata"]["source"], "orchestrator");
    }
}
