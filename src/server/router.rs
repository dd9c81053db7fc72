//! Agent HTTP server powered by axum.
//!
//! Serves:
//! - `GET  /.well-known/agent.json`: Agent Card discovery
//! - `POST /`: JSON-RPC 2.0 task endpoint
//! - `GET  /health`: health check

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    codec::JsonRpcResponse,
    protocol::{A2AError, A2AResult, AgentCard, AGENT_CARD_PATH},
    server::{handler, TaskManager},
};

/// An agent: one published card in front of one task manager
#[derive(Clone, Debug)]
pub struct A2AServer {
    card: Arc<AgentCard>,
    manager: TaskManager,
}

impl A2AServer {
    /// Pair a card with the task manager that serves it
    ///
    /// # Errors
    ///
    /// Returns `A2AError::InvalidAgentCard` if the card breaks its invariants
    pub fn new(card: AgentCard, manager: TaskManager) -> A2AResult<Self> {
        card.validate()?;
        Ok(Self {
            card: Arc::new(card),
            manager,
        })
    }

    /// The published card
    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// The task manager behind the endpoint
    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    /// Build the axum router for this agent
    pub fn router(self) -> Router {
        Router::new()
            .route(AGENT_CARD_PATH, get(get_agent_card))
            .route("/", post(handle_jsonrpc))
            .route("/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    /// Serve on an already bound listener until the process stops
    pub async fn serve(self, listener: TcpListener) -> A2AResult<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| A2AError::Transport(e.to_string()))?;

        tracing::info!(agent = %self.card.name, %addr, "agent listening");
        tracing::info!("   Agent Card: http://{}{}", addr, AGENT_CARD_PATH);

        axum::serve(listener, self.router())
            .await
            .map_err(|e| A2AError::Transport(e.to_string()))
    }
}

/// GET /.well-known/agent.json
async fn get_agent_card(State(server): State<A2AServer>) -> Json<AgentCard> {
    Json(server.card.as_ref().clone())
}

/// POST /
async fn handle_jsonrpc(State(server): State<A2AServer>, body: Bytes) -> Json<JsonRpcResponse> {
    Json(handler::handle_body(&server.manager, &body).await)
}

/// GET /health
async fn health_check(State(server): State<A2AServer>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "agent": server.card.name,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::{
        protocol::AgentSkill,
        reasoning::{from_fn, ReasoningOutput, ReasoningRequest},
    };

    use super::*;

    fn test_server() -> A2AServer {
        let card = AgentCard::new(
            "Equipment Agent",
            "Reports machine states",
            "http://127.0.0.1:40002/".parse().unwrap(),
        )
        .with_skill(AgentSkill::new(
            "material-availability-and-material-states",
            "Machine states",
            "Reads machine states over OPC UA",
        ));
        let manager = TaskManager::new(Arc::new(from_fn(|_request: ReasoningRequest| async {
            Ok(ReasoningOutput::infer(r#"{"mixer_state": "idle"}"#))
        })));
        A2AServer::new(card, manager).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_invalid_card_is_rejected() {
        let card = AgentCard::new("", "", "http://127.0.0.1:1/".parse().unwrap());
        let manager = test_server().manager().clone();
        assert!(matches!(
            A2AServer::new(card, manager),
            Err(A2AError::InvalidAgentCard(_))
        ));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_server().router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");

        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["agent"], "Equipment Agent");
    }

    #[tokio::test]
    async fn test_agent_card_endpoint() {
        let app = test_server().router();
        let req = Request::builder()
            .uri("/.well-known/agent.json")
            .body(Body::empty())
            .expect("request");

        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);

        let card = body_json(resp).await;
        assert_eq!(card["name"], "Equipment Agent");
        assert_eq!(card["skills"][0]["id"], "material-availability-and-material-states");
    }

    #[tokio::test]
    async fn test_jsonrpc_send_task() {
        let app = test_server().router();
        let body = json!({
            "jsonrpc": "2.0",
            "method": "tasks/send",
            "params": {
                "id": "t-1",
                "sessionId": "s-1",
                "message": {
                    "role": "user",
                    "parts": [{"type": "text", "text": "What is the state of the mixer?"}]
                }
            },
            "id": "req-1"
        });

        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");

        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["id"], "req-1");
        assert_eq!(json["result"]["status"], "completed");
        assert_eq!(json["result"]["result"]["parts"][0]["data"]["mixer_state"], "idle");
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let app = test_server().router();
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{"))
            .expect("request");

        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["error"]["code"], -32700);
    }
}
