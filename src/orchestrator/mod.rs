//! Fan-out/fan-in delegation across specialist agents
//!
//! An [`Orchestrator`] discovers specialists from its registry, picks the
//! ones an instruction needs, delegates to all of them concurrently and
//! folds whatever came back (answers and failures alike) into a single
//! [`OrchestrationReport`]. Every child is bounded by the delegation
//! policy's timeout, so one slow or dead specialist never holds up the
//! others.
//!
//! The orchestrator is itself a [`ReasoningCapability`]; put it behind a
//! [`TaskManager`](crate::server::TaskManager) to serve it as an agent.

pub mod selection;
pub mod synthesis;

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    client::{AgentConnector, ClientConfig, DiscoveryClient},
    config::OrchestratorConfig,
    protocol::{A2AError, AgentSkill, Message, Part},
    reasoning::{ReasoningCapability, ReasoningError, ReasoningOutput, ReasoningRequest},
};

pub use selection::{ReasoningSkillSelector, SkillSelector, SpecialistSelection};
pub use synthesis::{
    Decision, FailedAgent, OrchestrationReport, ReasoningSynthesizer, SpecialistOutcome,
    Synthesis, Synthesizer, VetoSynthesizer,
};

/// Outcome of one discovery pass over the registry
#[derive(Clone, Default)]
pub struct Roster {
    /// One connector per distinct card name, in registry order
    pub specialists: Vec<AgentConnector>,

    /// Registered endpoints that did not yield a usable card
    pub unreachable: Vec<UnreachableAgent>,
}

impl Roster {
    /// Whether the registry produced nothing at all
    pub fn is_empty(&self) -> bool {
        self.specialists.is_empty() && self.unreachable.is_empty()
    }
}

/// A registered endpoint that failed discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreachableAgent {
    pub endpoint: Url,
    pub reason: String,
}

impl UnreachableAgent {
    /// Count the endpoint as a specialist that could not contribute
    fn outcome(&self) -> SpecialistOutcome {
        SpecialistOutcome {
            agent: self.endpoint.to_string(),
            result: Err(A2AError::Unreachable {
                endpoint: self.endpoint.to_string(),
                reason: self.reason.clone(),
            }),
        }
    }
}

/// Delegates instructions to the specialists listed in a registry
pub struct Orchestrator {
    config: OrchestratorConfig,
    discovery: DiscoveryClient,
    http: reqwest::Client,
    roster: RwLock<Arc<Roster>>,
    selection: SpecialistSelection,
    synthesizer: Arc<dyn Synthesizer>,
}

impl Orchestrator {
    /// Create an orchestrator that consults every specialist and vetoes on `false` flags
    pub fn new(config: OrchestratorConfig) -> Self {
        let http = reqwest::Client::new();
        let discovery = DiscoveryClient::new(
            ClientConfig::new().with_timeout(config.discovery_timeout),
        )
        .with_http_client(http.clone());

        Self {
            config,
            discovery,
            http,
            roster: RwLock::new(Arc::new(Roster::default())),
            selection: SpecialistSelection::All,
            synthesizer: Arc::new(VetoSynthesizer::new()),
        }
    }

    /// Set how specialists are picked per instruction
    pub fn with_selection(mut self, selection: SpecialistSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Set how outcomes are combined into a verdict
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Rediscover the registry and replace the cached roster
    ///
    /// Card names identify specialists: when several endpoints serve the
    /// same name only the first one is kept.
    pub async fn refresh(&self) -> Arc<Roster> {
        let discovered = self
            .discovery
            .discover_each(self.config.registry.endpoints())
            .await;

        let mut roster = Roster::default();
        for (endpoint, result) in discovered {
            let card = match result {
                Ok(card) => card,
                Err(err) => {
                    warn!(%endpoint, kind = err.kind(), error = %err, "specialist unreachable");
                    roster.unreachable.push(UnreachableAgent {
                        endpoint,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if roster.specialists.iter().any(|known| known.name() == card.name) {
                warn!(agent = %card.name, %endpoint, "duplicate agent name, keeping the first");
                continue;
            }

            match AgentConnector::with_config(
                card,
                self.config.delegation.clone(),
                self.config.client.clone(),
                self.http.clone(),
            ) {
                Ok(connector) => roster.specialists.push(connector),
                Err(err) => {
                    warn!(%endpoint, error = %err, "cannot connect to agent");
                    roster.unreachable.push(UnreachableAgent {
                        endpoint,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            specialists = roster.specialists.len(),
            unreachable = roster.unreachable.len(),
            registered = self.config.registry.len(),
            "roster refreshed"
        );

        let roster = Arc::new(roster);
        *self.roster.write().await = roster.clone();
        roster
    }

    /// The roster as of the last refresh
    pub async fn specialists(&self) -> Arc<Roster> {
        self.roster.read().await.clone()
    }

    /// Delegate a plain-text instruction to the relevant specialists
    pub async fn orchestrate(&self, instruction: &str, session_id: &str) -> OrchestrationReport {
        self.orchestrate_message(Message::user(instruction), session_id)
            .await
    }

    /// Delegate a full message to the relevant specialists
    ///
    /// Never fails: specialists that error or time out, and registered
    /// endpoints that failed discovery, are listed in `failed_agents` and
    /// mark the report as degraded. Unreachable endpoints are reported
    /// whatever the selection, since their skills are unknown.
    #[tracing::instrument(skip(self, message), fields(specialists))]
    pub async fn orchestrate_message(
        &self,
        message: Message,
        session_id: &str,
    ) -> OrchestrationReport {
        let instruction = message.text_content();
        let roster = self.roster().await;
        let selected = self.select(&instruction, &roster.specialists).await;
        tracing::Span::current().record("specialists", selected.len());

        let fan_out = selected.iter().map(|connector| {
            let message = message.clone();
            async move {
                SpecialistOutcome {
                    agent: connector.name().to_string(),
                    result: connector.delegate_message(message, session_id).await,
                }
            }
        });
        let mut outcomes = join_all(fan_out).await;

        for outcome in &outcomes {
            if let Err(err) = &outcome.result {
                warn!(agent = %outcome.agent, kind = err.kind(), error = %err, "specialist failed");
            }
        }
        outcomes.extend(roster.unreachable.iter().map(UnreachableAgent::outcome));

        let synthesis = self.synthesizer.synthesize(&instruction, &outcomes).await;
        let report = OrchestrationReport::assemble(synthesis, &outcomes);
        info!(
            decision = ?report.decision,
            degraded = report.degraded,
            "orchestration finished"
        );
        report
    }

    /// Check which specialists still serve their card
    ///
    /// Keyed by card name; endpoints that failed discovery appear under
    /// their URL as unreachable.
    pub async fn check_specialists(&self) -> BTreeMap<String, bool> {
        let roster = self.roster().await;
        let pings = roster.specialists.iter().map(|connector| async move {
            let reachable = match connector.ping().await {
                Ok(_) => true,
                Err(err) => {
                    debug!(agent = %connector.name(), error = %err, "specialist unreachable");
                    false
                }
            };
            (connector.name().to_string(), reachable)
        });

        let mut health: BTreeMap<String, bool> = join_all(pings).await.into_iter().collect();
        for agent in &roster.unreachable {
            health.insert(agent.endpoint.to_string(), false);
        }
        health
    }

    async fn roster(&self) -> Arc<Roster> {
        if self.config.rediscover {
            self.refresh().await
        } else {
            self.specialists().await
        }
    }

    async fn select<'a>(
        &self,
        instruction: &str,
        roster: &'a [AgentConnector],
    ) -> Vec<&'a AgentConnector> {
        let selector = match &self.selection {
            SpecialistSelection::All => return roster.iter().collect(),
            SpecialistSelection::BySkills(selector) => selector,
        };

        let available: Vec<AgentSkill> = roster
            .iter()
            .flat_map(|connector| connector.card().skills.iter().cloned())
            .collect();

        match selector.select(instruction, &available).await {
            Ok(skills) => {
                debug!(?skills, "selected skills");
                roster
                    .iter()
                    .filter(|connector| connector.card().offers_any(&skills))
                    .collect()
            }
            Err(err) => {
                warn!(error = %err, "skill selection failed, consulting every specialist");
                roster.iter().collect()
            }
        }
    }
}

#[async_trait]
impl ReasoningCapability for Orchestrator {
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningOutput, ReasoningError> {
        let mut message = Message::user(request.instruction);
        if let Some(context) = request.context {
            message = message.with_part(Part::data(context));
        }

        let report = self
            .orchestrate_message(message, &request.session_id)
            .await;
        report
            .to_data()
            .map(ReasoningOutput::Data)
            .map_err(|e| ReasoningError::failed(e.to_string()))
    }
}
