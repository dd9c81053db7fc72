//! Agent discovery and capability types

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::error::A2AError;

/// Well-known path, relative to an agent's base URL, at which the Agent Card is served
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Agent Card for agent discovery
///
/// The Agent Card is published at [`AGENT_CARD_PATH`] and describes the
/// agent's identity, endpoint and skills. It is built once at startup and
/// never mutated afterwards. Its `name` is the lookup key used by
/// orchestrators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Name of the agent
    pub name: String,

    /// Human-readable description of the agent
    #[serde(default)]
    pub description: String,

    /// Base URL at which the agent accepts task requests
    pub url: Url,

    /// Agent version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Agent capabilities
    #[serde(default)]
    pub capabilities: AgentCapabilities,

    /// Content types accepted by default
    #[serde(default = "default_modes")]
    pub default_input_modes: Vec<String>,

    /// Content types produced by default
    #[serde(default = "default_modes")]
    pub default_output_modes: Vec<String>,

    /// Skills offered by the agent, in publication order
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

fn default_modes() -> Vec<String> {
    vec!["text".to_string()]
}

impl AgentCard {
    /// Create a new agent card
    pub fn new(name: impl Into<String>, description: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url,
            version: None,
            capabilities: AgentCapabilities::default(),
            default_input_modes: default_modes(),
            default_output_modes: default_modes(),
            skills: Vec::new(),
        }
    }

    /// Add a skill to the agent card
    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Set the agent capabilities
    pub fn with_capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the agent version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Find a skill by id
    pub fn skill(&self, id: &str) -> Option<&AgentSkill> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    /// Whether the card offers any of the given skill ids
    pub fn offers_any(&self, skill_ids: &HashSet<String>) -> bool {
        self.skills.iter().any(|skill| skill_ids.contains(&skill.id))
    }

    /// Check the card invariants
    ///
    /// A publishable card has a non-empty name, an http(s) URL and skills
    /// with non-empty, unique ids.
    pub fn validate(&self) -> Result<(), A2AError> {
        if self.name.trim().is_empty() {
            return Err(A2AError::InvalidAgentCard("name cannot be empty".into()));
        }

        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(A2AError::InvalidAgentCard(format!(
                "{}: unsupported url scheme '{}'",
                self.name,
                self.url.scheme()
            )));
        }

        let mut seen = HashSet::new();
        for skill in &self.skills {
            if skill.id.trim().is_empty() {
                return Err(A2AError::InvalidAgentCard(format!(
                    "{}: skill id cannot be empty",
                    self.name
                )));
            }
            if !seen.insert(skill.id.as_str()) {
                return Err(A2AError::InvalidAgentCard(format!(
                    "{}: duplicate skill id '{}'",
                    self.name, skill.id
                )));
            }
        }

        Ok(())
    }

    /// Parse a card fetched during discovery
    ///
    /// The document must be a JSON object with a usable `name` and `url`;
    /// otherwise the whole card is rejected. Skill entries are parsed one by
    /// one: malformed entries and repeated skill ids are dropped with a
    /// warning instead of failing the card.
    pub fn from_discovery_bytes(body: &[u8]) -> Result<Self, A2AError> {
        let mut document: Value = serde_json::from_slice(body)
            .map_err(|e| A2AError::InvalidAgentCard(format!("not a JSON document: {}", e)))?;

        let object = document
            .as_object_mut()
            .ok_or_else(|| A2AError::InvalidAgentCard("card must be a JSON object".into()))?;

        let raw_skills = match object.remove("skills") {
            Some(Value::Array(skills)) => skills,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(A2AError::InvalidAgentCard(
                    "skills must be an array".into(),
                ))
            }
        };

        let mut card: AgentCard = serde_json::from_value(document)
            .map_err(|e| A2AError::InvalidAgentCard(e.to_string()))?;

        let mut seen = HashSet::new();
        for raw in raw_skills {
            match serde_json::from_value::<AgentSkill>(raw) {
                Ok(skill) if skill.id.trim().is_empty() => {
                    tracing::warn!(agent = %card.name, "Skipping skill with empty id");
                }
                Ok(skill) if !seen.insert(skill.id.clone()) => {
                    tracing::warn!(
                        agent = %card.name,
                        skill = %skill.id,
                        "Skipping duplicate skill id"
                    );
                }
                Ok(skill) => card.skills.push(skill),
                Err(e) => {
                    tracing::warn!(
                        agent = %card.name,
                        error = %e,
                        "Skipping malformed skill entry"
                    );
                }
            }
        }

        card.validate()?;
        Ok(card)
    }
}

/// Agent capabilities
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Supports streaming responses
    #[serde(default)]
    pub streaming: bool,

    /// Supports push notifications via webhooks
    #[serde(default)]
    pub push_notifications: bool,

    /// Supports `tasks/cancel`
    #[serde(default)]
    pub cancellation: bool,
}

impl AgentCapabilities {
    /// Create capabilities with default values (all false)
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise support for `tasks/cancel`
    pub fn with_cancellation(mut self) -> Self {
        self.cancellation = true;
        self
    }
}

/// A skill advertised on an Agent Card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSkill {
    /// Identifier, unique within one card
    pub id: String,

    /// Human-friendly name
    pub name: String,

    /// What the skill does
    #[serde(default)]
    pub description: String,

    /// Search keywords
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Example phrases that exercise the skill
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl AgentSkill {
    /// Create a new skill
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            examples: Vec::new(),
        }
    }

    /// Add search tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add example phrases
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples.extend(examples.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn url() -> Url {
        "http://localhost:40002/".parse().unwrap()
    }

    fn equipment_card() -> AgentCard {
        AgentCard::new("EquipmentMonitoringAgent", "Machine states", url())
            .with_version("1.0.0")
            .with_skill(
                AgentSkill::new("machine-states", "Machine states", "Reports machine states")
                    .with_tags(["machine states"])
                    .with_examples(["Give me the status of production equipment"]),
            )
    }

    #[test]
    fn test_agent_card_creation() {
        let card = equipment_card();

        assert_eq!(card.name, "EquipmentMonitoringAgent");
        assert_eq!(card.version, Some("1.0.0".to_string()));
        assert_eq!(card.skills.len(), 1);
        assert!(card.skill("machine-states").is_some());
        assert!(card.validate().is_ok());
    }

    #[test]
    fn test_duplicate_skill_ids_rejected() {
        let card = equipment_card().with_skill(AgentSkill::new("machine-states", "Again", ""));
        assert!(matches!(
            card.validate(),
            Err(A2AError::InvalidAgentCard(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let card = AgentCard::new("  ", "", url());
        assert!(card.validate().is_err());
    }

    #[test]
    fn test_agent_card_serialization() {
        let card = equipment_card();

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["name"], "EquipmentMonitoringAgent");
        assert_eq!(json["url"], "http://localhost:40002/");
        assert_eq!(json["defaultInputModes"], json!(["text"]));

        let deserialized: AgentCard = serde_json::from_value(json).unwrap();
        assert_eq!(card, deserialized);
    }

    #[test]
    fn test_discovery_skips_malformed_skills() {
        let body = json!({
            "name": "MaterialCalculatingAgent",
            "url": "http://localhost:40003/",
            "skills": [
                {"id": "material-requirements-calculator", "name": "Materials"},
                {"name": "missing id"},
                "not even an object",
                {"id": "material-requirements-calculator", "name": "Duplicate"},
                {"id": "recipes", "name": "Recipes", "examples": ["Recipe for Product A"]}
            ]
        });

        let card = AgentCard::from_discovery_bytes(body.to_string().as_bytes()).unwrap();
        let ids: Vec<_> = card.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["material-requirements-calculator", "recipes"]);
        assert_eq!(card.skills[0].name, "Materials");
    }

    #[test]
    fn test_discovery_rejects_card_without_url() {
        let body = json!({"name": "NoUrl", "skills": []});
        assert!(matches!(
            AgentCard::from_discovery_bytes(body.to_string().as_bytes()),
            Err(A2AError::InvalidAgentCard(_))
        ));
    }

    #[test]
    fn test_discovery_rejects_non_json() {
        assert!(AgentCard::from_discovery_bytes(b"<html>nope</html>").is_err());
    }
}
