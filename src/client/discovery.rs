//! Agent discovery over the well-known card path

use futures::future::join_all;
use tracing::{debug, warn};
use url::Url;

use crate::{
    client::{A2AClientBuilder, ClientConfig},
    protocol::{A2AResult, AgentCard},
};

/// Fetches and validates Agent Cards from a list of endpoints
///
/// Every endpoint is fetched concurrently and independently; an endpoint that
/// cannot be reached, times out or serves an invalid card is logged and
/// skipped. There is no caching and no retry: callers that want a fresh
/// roster simply ask again.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl DiscoveryClient {
    /// Create a discovery client; `config.timeout` bounds each fetch
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Reuse an existing reqwest client (and its connection pool)
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Fetch and validate the card of a single agent
    pub async fn discover(&self, endpoint: &Url) -> A2AResult<AgentCard> {
        let mut client = A2AClientBuilder::new_http(endpoint.clone())
            .with_http_client(self.http.clone())
            .with_config(self.config.clone())
            .build()?;

        let card = client.discover().await?;
        debug!(agent = %card.name, %endpoint, skills = card.skills.len(), "discovered agent");
        Ok(card)
    }

    /// Fetch the cards of all `endpoints` concurrently, one result per endpoint in input order
    pub async fn discover_each(&self, endpoints: &[Url]) -> Vec<(Url, A2AResult<AgentCard>)> {
        let fetches = endpoints
            .iter()
            .map(|endpoint| async move { (endpoint.clone(), self.discover(endpoint).await) });

        join_all(fetches).await
    }

    /// Fetch the cards of all `endpoints`, keeping input order and skipping failures
    pub async fn list_agent_cards(&self, endpoints: &[Url]) -> Vec<AgentCard> {
        self.discover_each(endpoints)
            .await
            .into_iter()
            .filter_map(|(endpoint, result)| match result {
                Ok(card) => Some(card),
                Err(err) => {
                    warn!(%endpoint, error = %err, kind = err.kind(), "skipping agent");
                    None
                }
            })
            .collect()
    }
}

impl Default for DiscoveryClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}
