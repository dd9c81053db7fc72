//! Client builder for constructing A2A clients with composable layers

use std::{sync::Arc, time::Duration};

use tower_layer::Layer;
use url::Url;

use crate::{
    client::{AgentClient, ClientConfig},
    codec::{Codec, JsonRpcCodec},
    layer::{A2AValidationLayer, A2AValidationService},
    protocol::error::A2AError,
    service::A2AProtocolService,
    transport::{HttpTransport, Transport},
};

/// The service stack produced by [`A2AClientBuilder::build`]
pub type A2AServiceStack<T> = A2AValidationService<A2AProtocolService<T>>;

/// Client over HTTP with the default layers, as used by discovery and connectors
pub type HttpAgentClient = AgentClient<A2AServiceStack<HttpTransport>>;

/// Builder for constructing A2A clients
///
/// This builder provides a fluent API for configuring and building an A2A client
/// with customizable transport, codec, timeouts, and validation.
///
/// # Example
///
/// ```rust,no_run
/// use tower_a2a_delegate::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = "http://localhost:40003".parse().unwrap();
/// let mut client = A2AClientBuilder::new_http(url)
///     .with_timeout(Duration::from_secs(10))
///     .build()?;
///
/// let agent_card = client.discover().await?;
/// println!("Connected to: {}", agent_card.name);
/// # Ok(())
/// # }
/// ```
pub struct A2AClientBuilder<T: Transport> {
    agent_url: Url,
    transport: Option<T>,
    codec: Option<Arc<dyn Codec>>,
    config: ClientConfig,
}

impl<T: Transport> A2AClientBuilder<T> {
    /// Start a builder for the agent at `agent_url`; a transport must be supplied
    pub fn new(agent_url: Url) -> Self {
        Self {
            agent_url,
            transport: None,
            codec: None,
            config: ClientConfig::default(),
        }
    }

    /// Use a custom transport
    ///
    /// # Arguments
    ///
    /// * `transport` - The transport implementation to use
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom codec
    ///
    /// # Arguments
    ///
    /// * `codec` - The codec implementation to use
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Enable or disable response validation
    ///
    /// # Arguments
    ///
    /// * `enabled` - Whether to validate responses (default: true)
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.config = self.config.with_validation(enabled);
        self
    }

    /// Apply a whole client configuration
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// The agent this builder targets
    pub fn agent_url(&self) -> &Url {
        &self.agent_url
    }

    /// Build the A2A client
    ///
    /// This assembles all the Tower layers and returns a configured client.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport has been configured
    pub fn build(self) -> Result<AgentClient<A2AServiceStack<T>>, A2AError> {
        let transport = self.transport.ok_or_else(|| {
            A2AError::Protocol(
                "Transport not configured. Call new_http() or with_transport()".into(),
            )
        })?;

        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(JsonRpcCodec::new()));

        let service = A2AValidationLayer::new()
            .with_response_validation(self.config.validate_responses)
            .layer(A2AProtocolService::new(transport, codec));

        Ok(AgentClient::new(service, self.config))
    }
}

impl A2AClientBuilder<HttpTransport> {
    /// Create a new client builder with HTTP transport (JSON-RPC binding)
    ///
    /// # Arguments
    ///
    /// * `agent_url` - The base URL of the agent (e.g., "<http://localhost:40002>")
    pub fn new_http(agent_url: Url) -> Self {
        let transport = HttpTransport::new(agent_url.clone());
        Self::new(agent_url).with_transport(transport)
    }

    /// Share a reqwest client (connection pool) across several agent clients
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.transport = Some(HttpTransport::with_client(self.agent_url.clone(), client));
        self
    }
}
