//! Configuration consumed by discovery, connectors and the orchestrator

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::protocol::{A2AError, A2AResult};

pub use crate::client::{ClientConfig, DelegationPolicy};

/// Ordered list of known specialist endpoints
///
/// Loaded from a JSON registry file that is either a bare array of base
/// URLs or an object with an `agents` array:
///
/// ```json
/// ["http://localhost:40002", "http://localhost:40003"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentRegistry {
    agents: Vec<Url>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    List(Vec<Url>),
    Object { agents: Vec<Url> },
}

impl AgentRegistry {
    /// Create a registry from endpoints, keeping their order
    pub fn new(agents: Vec<Url>) -> Self {
        Self { agents }
    }

    /// Append an endpoint
    pub fn with_agent(mut self, agent: Url) -> Self {
        self.agents.push(agent);
        self
    }

    /// Parse a registry document
    pub fn from_json_str(document: &str) -> A2AResult<Self> {
        let file: RegistryFile = serde_json::from_str(document)
            .map_err(|e| A2AError::Config(format!("invalid agent registry: {}", e)))?;
        let agents = match file {
            RegistryFile::List(agents) | RegistryFile::Object { agents } => agents,
        };
        Ok(Self { agents })
    }

    /// Read and parse a registry file
    pub async fn load(path: impl AsRef<Path>) -> A2AResult<Self> {
        let path = path.as_ref();
        let document = tokio::fs::read_to_string(path).await.map_err(|e| {
            A2AError::Config(format!("cannot read agent registry {}: {}", path.display(), e))
        })?;
        let registry = Self::from_json_str(&document)?;
        tracing::debug!(path = %path.display(), agents = registry.len(), "loaded agent registry");
        Ok(registry)
    }

    /// Endpoints in registry order
    pub fn endpoints(&self) -> &[Url] {
        &self.agents
    }

    /// Number of endpoints
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry lists no endpoints
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Specialists to discover
    pub registry: AgentRegistry,

    /// How each specialist is delegated to (per-child timeout, polling)
    pub delegation: DelegationPolicy,

    /// Per-request settings for task calls
    pub client: ClientConfig,

    /// Bound on each Agent Card fetch
    pub discovery_timeout: Duration,

    /// Rediscover the roster on every request instead of using the cached one
    pub rediscover: bool,
}

impl OrchestratorConfig {
    /// Create a configuration for `registry` with defaults
    pub fn new(registry: AgentRegistry) -> Self {
        Self {
            registry,
            delegation: DelegationPolicy::default(),
            client: ClientConfig::default(),
            discovery_timeout: Duration::from_secs(5),
            rediscover: true,
        }
    }

    /// Set the delegation policy
    pub fn with_delegation(mut self, delegation: DelegationPolicy) -> Self {
        self.delegation = delegation;
        self
    }

    /// Set the per-request client configuration
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Set the card fetch timeout
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Choose between rediscovering per request and using the cached roster
    pub fn with_rediscover(mut self, rediscover: bool) -> Self {
        self.rediscover = rediscover;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_as_list() {
        let registry =
            AgentRegistry::from_json_str(r#"["http://localhost:40002", "http://localhost:40003"]"#)
                .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.endpoints()[0].as_str(), "http://localhost:40002/");
    }

    #[test]
    fn test_registry_as_object() {
        let registry =
            AgentRegistry::from_json_str(r#"{"agents": ["http://localhost:40003"]}"#).unwrap();
        assert_eq!(registry.endpoints()[0].port(), Some(40003));
    }

    #[test]
    fn test_registry_rejects_garbage() {
        let err = AgentRegistry::from_json_str(r#"{"agents": "nope"}"#).unwrap_err();
        assert!(matches!(err, A2AError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_registry_file() {
        let err = AgentRegistry::load("/nonexistent/agent_registry.json")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_orchestrator_defaults() {
        let config = OrchestratorConfig::new(AgentRegistry::default());
        assert!(config.rediscover);
        assert_eq!(config.delegation.timeout, Duration::from_secs(60));
        assert!(config.registry.is_empty());
    }
}
