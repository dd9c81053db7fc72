//! Agents served on ephemeral local ports

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio::{net::TcpListener, task::JoinHandle};
use tower_a2a_delegate::prelude::*;
use tracing_subscriber::EnvFilter;
use url::Url;

pub const EQUIPMENT_AGENT: &str = "EquipmentMonitoringAgent";
pub const MATERIAL_AGENT: &str = "MaterialCalculatingAgent";

pub const MACHINE_STATES_SKILL: &str = "material-availability-and-material-states";
pub const MATERIAL_SKILL: &str = "material-requirements-calculator";

/// Route library logs to the test output; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct RunningAgent {
    pub url: Url,
    pub handle: JoinHandle<()>,
}

impl Drop for RunningAgent {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `card_name` with one skill on 127.0.0.1 and return its base URL
pub async fn spawn_agent(
    card_name: &str,
    skill_id: &str,
    manager: impl FnOnce(Arc<dyn ReasoningCapability>) -> TaskManager,
    reasoning: Arc<dyn ReasoningCapability>,
) -> RunningAgent {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let url: Url = format!("http://{}/", addr).parse().expect("url");

    let card = AgentCard::new(card_name, format!("{} test double", card_name), url.clone())
        .with_skill(AgentSkill::new(skill_id, skill_id, "test skill"));
    let server = A2AServer::new(card, manager(reasoning)).expect("valid card");

    let handle = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    RunningAgent { url, handle }
}

/// Equipment agent reporting an idle mixer after `delay`
pub async fn equipment_agent(delay: Duration) -> RunningAgent {
    let reasoning = from_fn(move |_request: ReasoningRequest| async move {
        tokio::time::sleep(delay).await;
        Ok(ReasoningOutput::infer(
            json!({"mixer_state": "idle", "oven_state": "heating"}).to_string(),
        ))
    });

    spawn_agent(
        EQUIPMENT_AGENT,
        MACHINE_STATES_SKILL,
        |reasoning| TaskManager::new(reasoning).with_response_deadline(Duration::from_millis(100)),
        Arc::new(reasoning),
    )
    .await
}

/// Material agent answering immediately
pub async fn material_agent(sufficient: bool) -> RunningAgent {
    let reasoning = from_fn(move |_request: ReasoningRequest| async move {
        Ok(ReasoningOutput::infer(
            json!({"sufficient_materials": sufficient, "flour_kg": 40}).to_string(),
        ))
    });

    spawn_agent(MATERIAL_AGENT, MATERIAL_SKILL, TaskManager::new, Arc::new(reasoning)).await
}

/// An endpoint nothing listens on
pub fn dead_endpoint() -> Url {
    "http://127.0.0.1:9/".parse().expect("url")
}
