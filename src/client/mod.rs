//! High-level client API for A2A protocol

pub mod agent;
pub mod builder;
pub mod config;
pub mod connector;
pub mod discovery;

pub use agent::AgentClient;
pub use builder::{A2AClientBuilder, A2AServiceStack, HttpAgentClient};
pub use config::{ClientConfig, DelegationPolicy};
pub use connector::AgentConnector;
pub use discovery::DiscoveryClient;
