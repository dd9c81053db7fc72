//! # Tower A2A Delegate
//!
//! Agent-to-Agent task delegation built on Tower.
//!
//! Agents publish an Agent Card at `/.well-known/agent.json` and accept
//! tasks over JSON-RPC 2.0 (`tasks/send`, `tasks/get`, `tasks/cancel`). This
//! crate provides both sides of that exchange and the orchestration on top:
//!
//! - **Client**: [`AgentClient`](client::AgentClient) is a Tower service
//!   stack (validation layer, protocol service, transport) with typed task
//!   operations; [`AgentConnector`](client::AgentConnector) delegates one
//!   instruction to one agent and waits for a terminal state.
//! - **Discovery**: [`DiscoveryClient`](client::DiscoveryClient) fetches and
//!   validates cards, skipping agents that are down.
//! - **Server**: [`TaskManager`](server::TaskManager) runs the task state
//!   machine around a [`ReasoningCapability`](reasoning::ReasoningCapability);
//!   [`A2AServer`](server::A2AServer) exposes it with axum.
//! - **Orchestration**: [`Orchestrator`](orchestrator::Orchestrator) fans an
//!   instruction out to specialists, bounds each one by a timeout and
//!   returns one report, degraded when some specialists failed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tower_a2a_delegate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = AgentRegistry::load("agent_registry.json").await?;
//!     let orchestrator = Orchestrator::new(OrchestratorConfig::new(registry));
//!
//!     let report = orchestrator
//!         .orchestrate("Can I produce 4 batches of dough today?", "session-1")
//!         .await;
//!     println!("{:?}: {}", report.decision, report.reasoning);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod layer;
pub mod orchestrator;
pub mod protocol;
pub mod reasoning;
pub mod server;
pub mod service;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        client::{A2AClientBuilder, AgentClient, AgentConnector, ClientConfig, DiscoveryClient},
        config::{AgentRegistry, DelegationPolicy, OrchestratorConfig},
        orchestrator::{Decision, OrchestrationReport, Orchestrator, SpecialistSelection},
        protocol::{
            A2AError, A2AOperation, AgentCard, AgentSkill, Message, Part, Role, Task,
            TaskSendParams, TaskStatus,
        },
        reasoning::{
            from_fn, ReasoningCapability, ReasoningError, ReasoningOutput, ReasoningRequest,
        },
        server::{A2AServer, TaskManager},
    };
}
