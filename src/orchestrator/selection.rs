//! Choosing which specialists to consult

use std::{collections::HashSet, fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::{
    protocol::AgentSkill,
    reasoning::{ReasoningCapability, ReasoningError, ReasoningOutput, ReasoningRequest},
};

/// Decides which skills an instruction needs
#[async_trait]
pub trait SkillSelector: Send + Sync {
    /// Return the ids of the skills to target, chosen from `available`
    async fn select(
        &self,
        instruction: &str,
        available: &[AgentSkill],
    ) -> Result<HashSet<String>, ReasoningError>;
}

/// Routing rule for an orchestration request
#[derive(Clone, Default)]
pub enum SpecialistSelection {
    /// Consult every known specialist
    #[default]
    All,

    /// Consult the specialists offering at least one selected skill
    BySkills(Arc<dyn SkillSelector>),
}

impl fmt::Debug for SpecialistSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialistSelection::All => f.write_str("All"),
            SpecialistSelection::BySkills(_) => f.write_str("BySkills(..)"),
        }
    }
}

/// Lets a reasoning capability pick the skills
///
/// The capability receives the instruction plus `{"skills": [...]}` as
/// context and answers either with data `{"skills": ["id", ...]}` or with
/// text listing skill ids separated by commas or whitespace. Ids that no
/// specialist offers are ignored.
#[derive(Clone)]
pub struct ReasoningSkillSelector {
    reasoning: Arc<dyn ReasoningCapability>,
}

impl ReasoningSkillSelector {
    /// Wrap a reasoning capability
    pub fn new(reasoning: Arc<dyn ReasoningCapability>) -> Self {
        Self { reasoning }
    }
}

#[async_trait]
impl SkillSelector for ReasoningSkillSelector {
    async fn select(
        &self,
        instruction: &str,
        available: &[AgentSkill],
    ) -> Result<HashSet<String>, ReasoningError> {
        let known: HashSet<&str> = available.iter().map(|skill| skill.id.as_str()).collect();

        let mut context = Map::new();
        context.insert(
            "skills".into(),
            json!(available
                .iter()
                .map(|skill| json!({"id": skill.id, "description": skill.description}))
                .collect::<Vec<_>>()),
        );

        let request = ReasoningRequest {
            task_id: String::new(),
            session_id: String::new(),
            instruction: instruction.to_string(),
            context: Some(context),
        };

        let chosen: Vec<String> = match self.reasoning.reason(request).await? {
            ReasoningOutput::Data(data) => match data.get("skills") {
                Some(Value::Array(ids)) => ids
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => {
                    return Err(ReasoningError::failed(
                        "skill selection did not return a 'skills' array",
                    ))
                }
            },
            ReasoningOutput::Text(text) => text
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        };

        Ok(chosen
            .into_iter()
            .filter(|id| known.contains(id.as_str()))
            .collect())
    }
}
