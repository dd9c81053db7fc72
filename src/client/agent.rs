//! High-level A2A agent client

use std::time::Duration;

use tower::ServiceExt;
use tower_service::Service;

use crate::{
    client::config::ClientConfig,
    protocol::{
        A2AError, A2AOperation, AgentCard, Task, TaskIdParams, TaskQueryParams, TaskSendParams,
    },
    service::{A2ARequest, A2AResponse, RequestContext},
};

/// High-level A2A client for interacting with one agent
///
/// This client wraps a Tower service and provides convenient methods for the
/// task operations. Every call carries a fresh request id.
///
/// # Example
///
/// ```rust,no_run
/// use tower_a2a_delegate::prelude::*;
///
/// # async fn example() -> Result<(), A2AError> {
/// let url = "http://localhost:40002".parse().unwrap();
/// let mut client = A2AClientBuilder::new_http(url).build()?;
///
/// let params = TaskSendParams::new("t-1", "s-1", Message::user("What is the state of the mixer?"));
/// let task = client.send_task(params).await?;
/// println!("Task {} is {}", task.id, task.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AgentClient<S> {
    service: S,
    config: ClientConfig,
}

impl<S> AgentClient<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError>,
{
    /// Create a new agent client
    ///
    /// # Arguments
    ///
    /// * `service` - The Tower service that handles requests
    /// * `config` - Client configuration
    pub fn new(service: S, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a request context from the client configuration
    fn build_context(&self) -> RequestContext {
        RequestContext::new().with_timeout(self.config.timeout)
    }

    async fn execute(&mut self, operation: A2AOperation) -> Result<A2AResponse, A2AError> {
        let request = A2ARequest::new(operation, self.build_context());
        self.service.ready().await?.call(request).await
    }

    /// Submit a task, or replay it if the agent already finished it
    ///
    /// # Errors
    ///
    /// Returns `A2AError::TaskConflict` if the id is in flight or canceled
    pub async fn send_task(&mut self, params: TaskSendParams) -> Result<Task, A2AError> {
        match self.execute(A2AOperation::SendTask(params)).await? {
            A2AResponse::Task(task) => Ok(*task),
            _ => Err(A2AError::Protocol(
                "Expected task response from tasks/send".into(),
            )),
        }
    }

    /// Get a task by ID
    ///
    /// # Arguments
    ///
    /// * `task_id` - The unique identifier of the task to retrieve
    ///
    /// # Errors
    ///
    /// Returns `A2AError::TaskNotFound` if the task doesn't exist
    pub async fn get_task(&mut self, task_id: impl Into<String>) -> Result<Task, A2AError> {
        self.query_task(TaskQueryParams::new(task_id)).await
    }

    /// Get a task with query options such as `historyLength`
    pub async fn query_task(&mut self, params: TaskQueryParams) -> Result<Task, A2AError> {
        match self.execute(A2AOperation::GetTask(params)).await? {
            A2AResponse::Task(task) => Ok(*task),
            _ => Err(A2AError::Protocol(
                "Expected task response from tasks/get".into(),
            )),
        }
    }

    /// Cancel a task by ID
    ///
    /// # Returns
    ///
    /// The updated task in the canceled state
    pub async fn cancel_task(&mut self, task_id: impl Into<String>) -> Result<Task, A2AError> {
        let operation = A2AOperation::CancelTask(TaskIdParams::new(task_id));
        match self.execute(operation).await? {
            A2AResponse::Task(task) => Ok(*task),
            _ => Err(A2AError::Protocol(
                "Expected task response from tasks/cancel".into(),
            )),
        }
    }

    /// Discover agent capabilities by fetching the Agent Card
    ///
    /// This retrieves the agent's metadata from `/.well-known/agent.json`
    pub async fn discover(&mut self) -> Result<AgentCard, A2AError> {
        match self.execute(A2AOperation::DiscoverAgent).await? {
            A2AResponse::AgentCard(card) => Ok(*card),
            _ => Err(A2AError::Protocol(
                "Expected agent card response from discover".into(),
            )),
        }
    }

    /// Poll a task until it reaches a terminal state
    ///
    /// This is a convenience method that repeatedly calls get_task until
    /// the task is completed, failed or canceled.
    ///
    /// # Arguments
    ///
    /// * `task_id` - The task ID to poll
    /// * `poll_interval` - Pause between polls
    /// * `max_attempts` - Maximum number of polling attempts (0 = unlimited)
    ///
    /// # Errors
    ///
    /// Returns `A2AError::Timeout` when `max_attempts` polls saw no terminal state
    pub async fn poll_until_terminal(
        &mut self,
        task_id: &str,
        poll_interval: Duration,
        max_attempts: usize,
    ) -> Result<Task, A2AError> {
        let started = tokio::time::Instant::now();
        let mut attempts = 0;

        loop {
            let task = self.get_task(task_id).await?;

            if task.is_terminal() {
                return Ok(task);
            }

            attempts += 1;
            if max_attempts > 0 && attempts >= max_attempts {
                return Err(A2AError::Timeout {
                    task_id: task_id.to_string(),
                    elapsed: started.elapsed(),
                });
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}
