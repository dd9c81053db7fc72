//! Delegation of one instruction to one remote agent

use std::sync::Arc;

use tokio::time::Instant;
use tower_service::Service;
use tracing::{debug, info, warn, Span};
use uuid::Uuid;

use crate::{
    client::{A2AClientBuilder, A2AServiceStack, AgentClient, ClientConfig, DelegationPolicy},
    protocol::{
        A2AError, A2AResult, AgentCard, Message, Task, TaskSendParams, TaskStatus,
    },
    service::{A2ARequest, A2AResponse},
    transport::HttpTransport,
};

/// Connector bound to exactly one remote agent
///
/// `delegate` sends a `tasks/send` with a fresh task id and, while the task
/// is not terminal, polls `tasks/get` on the policy's interval. The whole
/// exchange is bounded by the policy's timeout.
#[derive(Clone)]
pub struct AgentConnector<S = A2AServiceStack<HttpTransport>> {
    card: Arc<AgentCard>,
    client: AgentClient<S>,
    policy: DelegationPolicy,
}

impl AgentConnector {
    /// Connect to the agent described by `card` over HTTP
    pub fn new(card: AgentCard, policy: DelegationPolicy) -> A2AResult<Self> {
        Self::with_config(card, policy, ClientConfig::default(), reqwest::Client::new())
    }

    /// Connect with an explicit client configuration and a shared reqwest client
    pub fn with_config(
        card: AgentCard,
        policy: DelegationPolicy,
        config: ClientConfig,
        http: reqwest::Client,
    ) -> A2AResult<Self> {
        let client = A2AClientBuilder::new_http(card.url.clone())
            .with_http_client(http)
            .with_config(config)
            .build()?;
        Ok(Self::with_client(card, client, policy))
    }
}

impl<S> AgentConnector<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError> + Clone,
{
    /// Wrap an already built client
    pub fn with_client(card: AgentCard, client: AgentClient<S>, policy: DelegationPolicy) -> Self {
        Self {
            card: Arc::new(card),
            client,
            policy,
        }
    }

    /// The card of the remote agent
    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// The remote agent's name
    pub fn name(&self) -> &str {
        &self.card.name
    }

    /// The delegation policy in effect
    pub fn policy(&self) -> &DelegationPolicy {
        &self.policy
    }

    /// Delegate a plain-text instruction and wait for the agent's answer
    pub async fn delegate(&self, instruction: &str, session_id: &str) -> A2AResult<Message> {
        self.delegate_message(Message::user(instruction), session_id)
            .await
    }

    /// Delegate a full message (text and data parts) and wait for the agent's answer
    ///
    /// # Errors
    ///
    /// * `A2AError::TaskFailed` - the agent finished the task as failed
    /// * `A2AError::TaskCanceled` - the task was canceled remotely
    /// * `A2AError::Timeout` - no terminal state within the policy timeout
    /// * `A2AError::Transport` - the agent could not be reached
    #[tracing::instrument(skip(self, message), fields(agent = %self.card.name, task_id))]
    pub async fn delegate_message(&self, message: Message, session_id: &str) -> A2AResult<Message> {
        let task_id = Uuid::now_v7().to_string();
        Span::current().record("task_id", task_id.as_str());

        let started = Instant::now();
        let params = TaskSendParams::new(task_id.clone(), session_id, message);
        let mut client = self.client.clone();

        let task = match tokio::time::timeout(self.policy.timeout, self.run(&mut client, params))
            .await
        {
            Ok(task) => task?,
            Err(_) => {
                warn!(timeout = ?self.policy.timeout, "gave up waiting for agent");
                return Err(A2AError::Timeout {
                    task_id,
                    elapsed: started.elapsed(),
                });
            }
        };

        info!(status = %task.status, elapsed = ?started.elapsed(), "delegation finished");
        Self::outcome(task)
    }

    /// Re-fetch the agent's card to check it is still serving
    pub async fn ping(&self) -> A2AResult<AgentCard> {
        self.client.clone().discover().await
    }

    async fn run(&self, client: &mut AgentClient<S>, params: TaskSendParams) -> A2AResult<Task> {
        let task_id = params.id.clone();
        let mut task = self.submit(client, params).await?;

        while !task.is_terminal() {
            tokio::time::sleep(self.policy.poll_interval).await;
            match client.get_task(task_id.as_str()).await {
                Ok(next) => task = next,
                // A dropped poll is retried on the next tick; the deadline still applies.
                Err(err) if err.is_transport() => {
                    warn!(error = %err, "poll failed, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(task)
    }

    /// Send the task, retrying connectivity failures with the same task id
    async fn submit(&self, client: &mut AgentClient<S>, params: TaskSendParams) -> A2AResult<Task> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match client.send_task(params.clone()).await {
                Ok(task) => return Ok(task),
                Err(A2AError::TaskConflict { .. }) if attempt > 1 => {
                    // An earlier attempt reached the agent before the connection dropped.
                    debug!(attempt, "send already accepted, switching to polling");
                    return client.get_task(params.id.as_str()).await;
                }
                Err(err) if err.is_transport() && attempt < self.policy.send_attempts => {
                    warn!(attempt, error = %err, "send failed, retrying with same task id");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn outcome(task: Task) -> A2AResult<Message> {
        match task.status {
            TaskStatus::Completed => task.result.ok_or_else(|| {
                A2AError::Protocol(format!("Task {} completed without a result", task.id))
            }),
            TaskStatus::Failed => Err(A2AError::TaskFailed {
                reason: task
                    .error
                    .map(|error| error.message)
                    .unwrap_or_else(|| "no reason given".to_string()),
                task_id: task.id,
            }),
            TaskStatus::Canceled => Err(A2AError::TaskCanceled { task_id: task.id }),
            status => Err(A2AError::Protocol(format!(
                "Task {} is still {}",
                task.id, status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use bytes::Bytes;
    use serde_json::{json, Value};

    use crate::{
        protocol::{error::TaskError, TaskStatus},
        transport::{mock::MockTransport, TransportRequest, TransportResponse},
    };

    use super::*;

    type MockConnector = AgentConnector<A2AServiceStack<MockTransport>>;

    fn connector(transport: MockTransport, policy: DelegationPolicy) -> MockConnector {
        let card = AgentCard::new("Equipment Agent", "", "http://mock.agent/".parse().unwrap());
        let client = A2AClientBuilder::new(card.url.clone())
            .with_transport(transport)
            .build()
            .unwrap();
        AgentConnector::with_client(card, client, policy)
    }

    fn policy() -> DelegationPolicy {
        DelegationPolicy::new()
            .with_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(100))
    }

    /// Answer a JSON-RPC request with the task produced by `shape`
    fn answer(req: &TransportRequest, shape: impl FnOnce(&mut Task)) -> TransportResponse {
        let request: Value = serde_json::from_slice(&req.body).unwrap();
        let task_id = request["params"]["id"].as_str().unwrap();
        let mut task = Task::new(task_id, "s-1", Message::user("instruction"));
        shape(&mut task);
        let envelope = json!({"jsonrpc": "2.0", "id": request["id"], "result": task});
        TransportResponse::new(200).body(Bytes::from(envelope.to_string()))
    }

    fn method(req: &TransportRequest) -> String {
        let request: Value = serde_json::from_slice(&req.body).unwrap();
        request["method"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_completed_on_send() {
        let transport = MockTransport::new(|req| {
            answer(&req, |task| {
                task.start().unwrap();
                task.complete(Message::agent("mixer_state: idle")).unwrap();
            })
        });

        let result = connector(transport, policy())
            .delegate("What is the state of the mixer?", "s-1")
            .await
            .unwrap();

        assert_eq!(result.text_content(), "mixer_state: idle");
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_terminal() {
        let gets = Arc::new(AtomicUsize::new(0));
        let counter = gets.clone();
        let transport = MockTransport::new(move |req| {
            let is_get = method(&req) == "tasks/get";
            let done = is_get && counter.fetch_add(1, Ordering::SeqCst) >= 1;
            answer(&req, |task| {
                task.start().unwrap();
                if done {
                    task.complete(Message::agent("ok")).unwrap();
                }
            })
        });

        let result = connector(transport, policy())
            .delegate("check", "s-1")
            .await
            .unwrap();

        assert_eq!(result.text_content(), "ok");
        assert_eq!(gets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remote_failure_surfaces_reason() {
        let transport = MockTransport::new(|req| {
            answer(&req, |task| {
                task.start().unwrap();
                task.fail(TaskError::new("reasoning_failed", "OPC UA server unreachable"))
                    .unwrap();
            })
        });

        let err = connector(transport, policy())
            .delegate("check", "s-1")
            .await
            .unwrap_err();

        match err {
            A2AError::TaskFailed { reason, .. } => assert_eq!(reason, "OPC UA server unreachable"),
            other => panic!("Expected TaskFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_cancel() {
        let transport = MockTransport::new(|req| {
            answer(&req, |task| {
                task.cancel().unwrap();
            })
        });

        let err = connector(transport, policy())
            .delegate("check", "s-1")
            .await
            .unwrap_err();

        assert!(matches!(err, A2AError::TaskCanceled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_distinct_from_failure() {
        let transport = MockTransport::new(|req| {
            answer(&req, |task| {
                task.start().unwrap();
            })
        });

        let err = connector(transport, policy().with_timeout(Duration::from_secs(1)))
            .delegate("check", "s-1")
            .await
            .unwrap_err();

        match err {
            A2AError::Timeout { elapsed, .. } => assert!(elapsed >= Duration::from_secs(1)),
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_retries_with_same_task_id() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let transport = MockTransport::fallible(move |req| {
            let request: Value = serde_json::from_slice(&req.body).unwrap();
            let mut log = log.lock().unwrap();
            log.push(request["params"]["id"].as_str().unwrap().to_string());
            if log.len() == 1 {
                return Err(A2AError::Transport("connection reset".into()));
            }
            Ok(answer(&req, |task| {
                task.start().unwrap();
                task.complete(Message::agent("ok")).unwrap();
            }))
        });

        connector(transport, policy())
            .delegate("check", "s-1")
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
    }

    #[tokio::test]
    async fn test_conflict_on_retry_switches_to_polling() {
        let sends = Arc::new(AtomicUsize::new(0));
        let counter = sends.clone();
        let transport = MockTransport::fallible(move |req| {
            if method(&req) == "tasks/get" {
                return Ok(answer(&req, |task| {
                    task.start().unwrap();
                    task.complete(Message::agent("landed")).unwrap();
                }));
            }
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Err(A2AError::Transport("connection reset".into())),
                _ => {
                    let request: Value = serde_json::from_slice(&req.body).unwrap();
                    let envelope = json!({
                        "jsonrpc": "2.0",
                        "id": request["id"],
                        "error": {"code": -32010, "message": "conflict", "data": {"status": "working"}}
                    });
                    Ok(TransportResponse::new(200).body(Bytes::from(envelope.to_string())))
                }
            }
        });

        let result = connector(transport, policy())
            .delegate("check", "s-1")
            .await
            .unwrap();

        assert_eq!(result.text_content(), "landed");
    }

    #[tokio::test]
    async fn test_transport_failure_after_last_attempt() {
        let transport =
            MockTransport::fallible(|_req| Err(A2AError::Transport("connection refused".into())));
        let calls = transport.clone();

        let err = connector(transport, policy().with_send_attempts(3))
            .delegate("check", "s-1")
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(calls.calls(), 3);
    }

    #[tokio::test]
    async fn test_status_of_outcome() {
        let mut task = Task::new("t-1", "s-1", Message::user("x"));
        task.start().unwrap();
        assert_eq!(task.status, TaskStatus::Working);
        assert!(matches!(
            MockConnector::outcome(task),
            Err(A2AError::Protocol(_))
        ));
    }
}
