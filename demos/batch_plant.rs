//! A bakery batch plant: two specialists and an orchestrator, all on localhost
//!
//! ```text
//! RUST_LOG=tower_a2a_delegate=debug cargo run --example batch_plant -- 4
//! ```
//!
//! Serves the equipment agent on :40002, the material agent on :40003 and
//! the orchestrator on :40004, then asks the orchestrator whether the given
//! number of batches can be produced.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use serde_json::json;
use tokio::net::TcpListener;
use tower_a2a_delegate::{prelude::*, protocol::AgentCapabilities};
use tracing_subscriber::EnvFilter;
use url::Url;

const FLOUR_IN_STOCK_KG: f64 = 120.0;
const FLOUR_PER_BATCH_KG: f64 = 25.0;

async fn serve(
    port: u16,
    card: impl FnOnce(Url) -> AgentCard,
    reasoning: Arc<dyn ReasoningCapability>,
) -> anyhow::Result<Url> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("cannot bind port {port}"))?;
    let url: Url = format!("http://127.0.0.1:{port}/").parse()?;

    let manager = TaskManager::new(reasoning)
        .with_reasoning_timeout(Duration::from_secs(30))
        .with_response_deadline(Duration::from_secs(2));
    let server = A2AServer::new(card(url.clone()), manager)?;

    tokio::spawn(async move {
        if let Err(err) = server.serve(listener).await {
            tracing::error!(error = %err, "agent stopped");
        }
    });
    Ok(url)
}

fn batches_in(instruction: &str) -> f64 {
    instruction
        .split_whitespace()
        .find_map(|word| word.parse::<f64>().ok())
        .unwrap_or(1.0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let batches: u32 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u32>())
        .transpose()
        .context("batch count must be a number")?
        .unwrap_or(4);

    println!("🏭 Batch plant demo\n");

    let equipment = serve(
        40002,
        |url| {
            AgentCard::new(
                "EquipmentMonitoringAgent",
                "Reports the state of the mixers and ovens",
                url,
            )
            .with_skill(
                AgentSkill::new(
                    "material-availability-and-material-states",
                    "Machine states",
                    "Reads the current state of every machine on the line",
                )
                .with_examples(["What is the state of the mixer?"]),
            )
        },
        Arc::new(from_fn(|_request: ReasoningRequest| async {
            Ok(ReasoningOutput::Data(
                json!({"mixer_state": "idle", "oven_state": "heating"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            ))
        })),
    )
    .await?;

    let material = serve(
        40003,
        |url| {
            AgentCard::new(
                "MaterialCalculatingAgent",
                "Calculates raw material requirements",
                url,
            )
            .with_skill(AgentSkill::new(
                "material-requirements-calculator",
                "Material requirements",
                "Checks whether stock covers a number of batches",
            ))
        },
        Arc::new(from_fn(|request: ReasoningRequest| async move {
            let needed = batches_in(&request.instruction) * FLOUR_PER_BATCH_KG;
            Ok(ReasoningOutput::Data(
                json!({
                    "flour_needed_kg": needed,
                    "flour_in_stock_kg": FLOUR_IN_STOCK_KG,
                    "sufficient_materials": needed <= FLOUR_IN_STOCK_KG,
                })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            ))
        })),
    )
    .await?;

    let registry = AgentRegistry::new(vec![equipment, material]);
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::new(registry).with_delegation(
            DelegationPolicy::new()
                .with_timeout(Duration::from_secs(30))
                .with_poll_interval(Duration::from_millis(250)),
        ),
    );

    let front = serve(
        40004,
        |url| {
            AgentCard::new(
                "OrchestratorAgent",
                "Decides whether a production request can be fulfilled",
                url,
            )
            .with_capabilities(AgentCapabilities::new().with_cancellation())
            .with_skill(AgentSkill::new(
                "orchestrate",
                "Orchestrate",
                "Consults the plant specialists and answers yes or no",
            ))
        },
        Arc::new(orchestrator),
    )
    .await?;

    let mut client = A2AClientBuilder::new_http(front).build()?;
    let card = client.discover().await?;
    println!("✓ Connected to: {}", card.name);

    let instruction = format!("Can I produce {batches} batches of dough today?");
    println!("📤 {instruction}");

    let task = client
        .send_task(TaskSendParams::new(
            uuid::Uuid::now_v7().to_string(),
            "demo-session",
            Message::user(instruction),
        ))
        .await?;
    let task = if task.is_terminal() {
        task
    } else {
        client
            .poll_until_terminal(&task.id, Duration::from_millis(250), 0)
            .await?
    };

    let report = task
        .result
        .and_then(|message| message.data().cloned())
        .context("orchestrator returned no report")?;
    println!("📥 {}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
