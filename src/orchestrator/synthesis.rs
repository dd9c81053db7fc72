//! Combining specialist outcomes into one answer

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    protocol::{A2AError, Message},
    reasoning::{ReasoningCapability, ReasoningOutput, ReasoningRequest},
};

/// What one specialist contributed to an orchestration
#[derive(Debug)]
pub struct SpecialistOutcome {
    /// Card name, or the endpoint URL of a specialist that failed discovery
    pub agent: String,

    /// The answer, or why there is none
    pub result: Result<Message, A2AError>,
}

impl SpecialistOutcome {
    /// What the specialist reported: its data part, or its text
    pub fn finding(&self) -> Option<Value> {
        let message = self.result.as_ref().ok()?;
        Some(match message.data() {
            Some(data) => Value::Object(data.clone()),
            None => Value::String(message.text_content()),
        })
    }
}

/// Final verdict of an orchestration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Yes,
    No,
    /// No verdict could be reached
    Error,
}

/// Verdict plus the explanation behind it
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub decision: Decision,
    pub reasoning: String,
}

impl Synthesis {
    pub fn new(decision: Decision, reasoning: impl Into<String>) -> Self {
        Self {
            decision,
            reasoning: reasoning.into(),
        }
    }
}

/// A specialist that was selected or registered but did not contribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAgent {
    pub agent: String,
    /// `transport`, `timeout`, `failed`, ... (see [`A2AError::kind`])
    pub kind: String,
    pub message: String,
}

/// The single combined answer of an orchestration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationReport {
    pub decision: Decision,
    pub reasoning: String,
    /// True when a selected specialist failed or a registered one was unreachable
    pub degraded: bool,
    /// Specialists that answered, in roster order
    pub tools_used: Vec<String>,
    pub failed_agents: Vec<FailedAgent>,
    /// Specialist name to what it reported
    pub findings: Map<String, Value>,
}

impl OrchestrationReport {
    /// Annotate a synthesis with who contributed and who failed
    pub fn assemble(synthesis: Synthesis, outcomes: &[SpecialistOutcome]) -> Self {
        let mut tools_used = Vec::new();
        let mut failed_agents = Vec::new();
        let mut findings = Map::new();

        for outcome in outcomes {
            match &outcome.result {
                Ok(_) => {
                    tools_used.push(outcome.agent.clone());
                    if let Some(finding) = outcome.finding() {
                        findings.insert(outcome.agent.clone(), finding);
                    }
                }
                Err(err) => failed_agents.push(FailedAgent {
                    agent: outcome.agent.clone(),
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                }),
            }
        }

        Self {
            decision: synthesis.decision,
            reasoning: synthesis.reasoning,
            degraded: !failed_agents.is_empty(),
            tools_used,
            failed_agents,
            findings,
        }
    }

    /// The report as a JSON object, for a structured result message
    pub fn to_data(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Turns specialist outcomes into a verdict
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, instruction: &str, outcomes: &[SpecialistOutcome]) -> Synthesis;
}

/// Deterministic rule: any specialist reporting a veto flag as `false` means No
///
/// Defaults to the flags `feasible`, `sufficient_materials` and
/// `sufficient`. With no answering specialist the verdict is No, since
/// nothing confirms the request can be satisfied.
///
/// By default the verdict is best effort: it is drawn from the specialists
/// that answered, and a failed specialist only degrades the report. A
/// failed specialist may be the one whose flag would have vetoed, so
/// callers that cannot act on a partial picture should enable
/// [`with_failures_veto`](Self::with_failures_veto).
#[derive(Debug, Clone)]
pub struct VetoSynthesizer {
    veto_keys: Vec<String>,
    failures_veto: bool,
}

impl VetoSynthesizer {
    pub fn new() -> Self {
        Self {
            veto_keys: ["feasible", "sufficient_materials", "sufficient"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            failures_veto: false,
        }
    }

    /// Answer No whenever a specialist failed, instead of deciding from the rest
    pub fn with_failures_veto(mut self, enabled: bool) -> Self {
        self.failures_veto = enabled;
        self
    }

    /// Also treat `key: false` as a veto
    pub fn with_veto_key(mut self, key: impl Into<String>) -> Self {
        self.veto_keys.push(key.into());
        self
    }

    fn veto(&self, message: &Message) -> Option<&str> {
        let data = message.data()?;
        self.veto_keys
            .iter()
            .find(|key| data.get(key.as_str()) == Some(&Value::Bool(false)))
            .map(String::as_str)
    }
}

impl Default for VetoSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Synthesizer for VetoSynthesizer {
    async fn synthesize(&self, _instruction: &str, outcomes: &[SpecialistOutcome]) -> Synthesis {
        if outcomes.is_empty() {
            return Synthesis::new(Decision::No, "No specialists were available to consult");
        }

        let answered: Vec<(&str, &Message)> = outcomes
            .iter()
            .filter_map(|outcome| {
                outcome
                    .result
                    .as_ref()
                    .ok()
                    .map(|message| (outcome.agent.as_str(), message))
            })
            .collect();

        if answered.is_empty() {
            return Synthesis::new(
                Decision::No,
                format!("None of the {} specialists answered", outcomes.len()),
            );
        }

        if self.failures_veto {
            if let Some((agent, err)) = outcomes
                .iter()
                .find_map(|outcome| Some((&outcome.agent, outcome.result.as_ref().err()?)))
            {
                return Synthesis::new(
                    Decision::No,
                    format!("{} did not answer ({})", agent, err.kind()),
                );
            }
        }

        for (agent, message) in &answered {
            if let Some(key) = self.veto(message) {
                return Synthesis::new(Decision::No, format!("{} reported {} = false", agent, key));
            }
        }

        let failed = outcomes.len() - answered.len();
        let mut reasoning = format!(
            "{} specialist(s) answered without a blocking condition",
            answered.len()
        );
        if failed > 0 {
            reasoning.push_str(&format!("; {} did not answer", failed));
        }
        Synthesis::new(Decision::Yes, reasoning)
    }
}

/// Lets a reasoning capability weigh the outcomes
///
/// The capability receives the instruction and, as context,
/// `{"findings": {...}, "failed": [...]}`. It answers with data
/// `{"decision": "Yes"|"No", "reasoning": "..."}` or with text whose first
/// word is yes or no. Anything else, including a reasoning error, yields
/// [`Decision::Error`].
#[derive(Clone)]
pub struct ReasoningSynthesizer {
    reasoning: Arc<dyn ReasoningCapability>,
}

impl ReasoningSynthesizer {
    pub fn new(reasoning: Arc<dyn ReasoningCapability>) -> Self {
        Self { reasoning }
    }

    /// Read the verdict from the first word, ignoring case and punctuation
    fn parse_decision(text: &str) -> Option<Decision> {
        let word = text
            .split_whitespace()
            .next()?
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_ascii_lowercase();
        match word.as_str() {
            "yes" => Some(Decision::Yes),
            "no" => Some(Decision::No),
            _ => None,
        }
    }
}

#[async_trait]
impl Synthesizer for ReasoningSynthesizer {
    async fn synthesize(&self, instruction: &str, outcomes: &[SpecialistOutcome]) -> Synthesis {
        let findings: Map<String, Value> = outcomes
            .iter()
            .filter_map(|outcome| Some((outcome.agent.clone(), outcome.finding()?)))
            .collect();
        let failed: Vec<Value> = outcomes
            .iter()
            .filter_map(|outcome| {
                let err = outcome.result.as_ref().err()?;
                Some(json!({"agent": outcome.agent, "kind": err.kind(), "message": err.to_string()}))
            })
            .collect();

        let mut context = Map::new();
        context.insert("findings".into(), Value::Object(findings));
        context.insert("failed".into(), Value::Array(failed));

        let request = ReasoningRequest {
            task_id: String::new(),
            session_id: String::new(),
            instruction: instruction.to_string(),
            context: Some(context),
        };

        match self.reasoning.reason(request).await {
            Ok(ReasoningOutput::Data(data)) => {
                let reasoning = data
                    .get("reasoning")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                match data
                    .get("decision")
                    .and_then(Value::as_str)
                    .and_then(Self::parse_decision)
                {
                    Some(decision) => Synthesis::new(decision, reasoning),
                    None => Synthesis::new(Decision::Error, "Synthesis returned no decision"),
                }
            }
            Ok(ReasoningOutput::Text(text)) => match Self::parse_decision(&text) {
                Some(decision) => Synthesis::new(decision, text),
                None => Synthesis::new(Decision::Error, text),
            },
            Err(err) => {
                tracing::warn!(error = %err, "synthesis failed");
                Synthesis::new(Decision::Error, format!("Synthesis failed: {}", err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::reasoning::{MockReasoningCapability, ReasoningError};

    use super::*;

    fn answered(agent: &str, data: Value) -> SpecialistOutcome {
        let data = match data {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        SpecialistOutcome {
            agent: agent.into(),
            result: Ok(Message::agent_data(data)),
        }
    }

    fn timed_out(agent: &str) -> SpecialistOutcome {
        SpecialistOutcome {
            agent: agent.into(),
            result: Err(A2AError::Timeout {
                task_id: "t-9".into(),
                elapsed: Duration::from_secs(2),
            }),
        }
    }

    #[tokio::test]
    async fn test_all_clear_is_yes() {
        let outcomes = vec![
            answered("EquipmentMonitoringAgent", json!({"mixer_state": "idle"})),
            answered("MaterialCalculatingAgent", json!({"sufficient_materials": true})),
        ];

        let synthesis = VetoSynthesizer::new().synthesize("produce?", &outcomes).await;
        assert_eq!(synthesis.decision, Decision::Yes);
    }

    #[tokio::test]
    async fn test_veto_is_no() {
        let outcomes = vec![
            answered("EquipmentMonitoringAgent", json!({"mixer_state": "idle"})),
            answered("MaterialCalculatingAgent", json!({"sufficient_materials": false})),
        ];

        let synthesis = VetoSynthesizer::new().synthesize("produce?", &outcomes).await;
        assert_eq!(synthesis.decision, Decision::No);
        assert!(synthesis.reasoning.contains("MaterialCalculatingAgent"));
    }

    #[tokio::test]
    async fn test_nobody_answered_is_no() {
        let synthesis = VetoSynthesizer::new()
            .synthesize("produce?", &[timed_out("EquipmentMonitoringAgent")])
            .await;
        assert_eq!(synthesis.decision, Decision::No);

        let synthesis = VetoSynthesizer::new().synthesize("produce?", &[]).await;
        assert_eq!(synthesis.decision, Decision::No);
    }

    #[tokio::test]
    async fn test_failures_veto() {
        let outcomes = vec![
            answered("MaterialCalculatingAgent", json!({"sufficient_materials": true})),
            timed_out("EquipmentMonitoringAgent"),
        ];

        let lenient = VetoSynthesizer::new().synthesize("produce?", &outcomes).await;
        assert_eq!(lenient.decision, Decision::Yes);
        assert!(lenient.reasoning.contains("1 did not answer"));

        let strict = VetoSynthesizer::new()
            .with_failures_veto(true)
            .synthesize("produce?", &outcomes)
            .await;
        assert_eq!(strict.decision, Decision::No);
        assert_eq!(strict.reasoning, "EquipmentMonitoringAgent did not answer (timeout)");
    }

    #[tokio::test]
    async fn test_custom_veto_key() {
        let outcomes = vec![answered(
            "EquipmentMonitoringAgent",
            json!({"mixer_state": "idle", "mixer_available": false}),
        )];

        let default = VetoSynthesizer::new().synthesize("produce?", &outcomes).await;
        assert_eq!(default.decision, Decision::Yes);

        let synthesis = VetoSynthesizer::new()
            .with_veto_key("mixer_available")
            .synthesize("produce?", &outcomes)
            .await;
        assert_eq!(synthesis.decision, Decision::No);
        assert_eq!(
            synthesis.reasoning,
            "EquipmentMonitoringAgent reported mixer_available = false"
        );
    }

    #[test]
    fn test_decision_is_read_from_the_first_word() {
        let parse = ReasoningSynthesizer::parse_decision;

        assert_eq!(parse("Yes, materials suffice"), Some(Decision::Yes));
        assert_eq!(parse("  NO. The mixer is down"), Some(Decision::No));
        assert_eq!(parse("no"), Some(Decision::No));
        assert_eq!(parse("not sure"), None);
        assert_eq!(parse("none of them answered"), None);
        assert_eq!(parse("nothing blocks it, yes"), None);
        assert_eq!(parse("yesterday was fine"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_report_marks_degraded() {
        let outcomes = vec![
            answered("MaterialCalculatingAgent", json!({"sufficient_materials": true})),
            timed_out("EquipmentMonitoringAgent"),
        ];

        let report =
            OrchestrationReport::assemble(Synthesis::new(Decision::Yes, "ok"), &outcomes);

        assert!(report.degraded);
        assert_eq!(report.tools_used, vec!["MaterialCalculatingAgent"]);
        assert_eq!(report.failed_agents[0].agent, "EquipmentMonitoringAgent");
        assert_eq!(report.failed_agents[0].kind, "timeout");
        assert_eq!(report.findings["MaterialCalculatingAgent"]["sufficient_materials"], true);

        let data = report.to_data().unwrap();
        assert_eq!(data["decision"], "Yes");
    }

    #[tokio::test]
    async fn test_reasoning_synthesizer() {
        let mut reasoning = MockReasoningCapability::new();
        reasoning
            .expect_reason()
            .withf(|request| {
                let context = request.context.as_ref().unwrap();
                context["findings"]["MaterialCalculatingAgent"]["sufficient_materials"] == true
                    && context["failed"][0]["kind"] == "timeout"
            })
            .returning(|_| {
                Ok(ReasoningOutput::infer(
                    r#"{"decision": "Yes", "reasoning": "materials suffice"}"#,
                ))
            });

        let outcomes = vec![
            answered("MaterialCalculatingAgent", json!({"sufficient_materials": true})),
            timed_out("EquipmentMonitoringAgent"),
        ];
        let synthesis = ReasoningSynthesizer::new(Arc::new(reasoning))
            .synthesize("produce?", &outcomes)
            .await;

        assert_eq!(synthesis, Synthesis::new(Decision::Yes, "materials suffice"));
    }

    #[tokio::test]
    async fn test_reasoning_synthesizer_failure_is_error() {
        let mut reasoning = MockReasoningCapability::new();
        reasoning
            .expect_reason()
            .returning(|_| Err(ReasoningError::failed("model unavailable")));

        let synthesis = ReasoningSynthesizer::new(Arc::new(reasoning))
            .synthesize("produce?", &[])
            .await;

        assert_eq!(synthesis.decision, Decision::Error);
    }
}
