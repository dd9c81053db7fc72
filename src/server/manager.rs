//! Task state machine of one agent

use std::{
    any::Any,
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::Arc,
    time::Duration,
};

use futures::FutureExt;
use tokio::{
    sync::{Mutex, RwLock},
    task::AbortHandle,
};
use tracing::{debug, info, warn};

use crate::{
    protocol::{
        A2AError, A2AResult, Message, Task, TaskError, TaskIdParams, TaskQueryParams,
        TaskSendParams, TaskStatus,
    },
    reasoning::{ReasoningCapability, ReasoningRequest},
};

/// In-memory task store
pub type TaskStore = Arc<RwLock<HashMap<String, Task>>>;

/// Failure code recorded when the reasoning capability returns an error or nothing usable
pub const REASONING_FAILED: &str = "reasoning_failed";

/// Failure code recorded when the reasoning capability exceeds its time budget
pub const REASONING_TIMEOUT: &str = "reasoning_timeout";

/// Failure code recorded when the reasoning capability panics
pub const REASONING_PANICKED: &str = "reasoning_panicked";

/// Owns the tasks of one agent and drives them through their lifecycle
///
/// Task ids are idempotency keys: a finished task is replayed instead of
/// reprocessed, an unfinished (or canceled) one is a conflict. Reasoning
/// runs on its own tokio task, so a caller that goes away does not strand a
/// task in `working`, and a cancel can abort it. Locks on the store are
/// never held across the reasoning call.
#[derive(Clone)]
pub struct TaskManager {
    tasks: TaskStore,
    inflight: Arc<Mutex<HashMap<String, AbortHandle>>>,
    reasoning: Arc<dyn ReasoningCapability>,
    reasoning_timeout: Option<Duration>,
    response_deadline: Option<Duration>,
}

impl TaskManager {
    /// Create a manager serving `reasoning`
    pub fn new(reasoning: Arc<dyn ReasoningCapability>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            reasoning,
            reasoning_timeout: None,
            response_deadline: None,
        }
    }

    /// Bound each reasoning invocation; overrunning tasks fail with `reasoning_timeout`
    pub fn with_reasoning_timeout(mut self, timeout: Duration) -> Self {
        self.reasoning_timeout = Some(timeout);
        self
    }

    /// Answer `send` with the `working` snapshot if the task is not done in time
    ///
    /// Processing continues in the background; callers poll `get`.
    pub fn with_response_deadline(mut self, deadline: Duration) -> Self {
        self.response_deadline = Some(deadline);
        self
    }

    /// Submit a task, or replay it if it already finished
    ///
    /// # Errors
    ///
    /// * `A2AError::TaskConflict` - the id is still processing, or was canceled
    /// * `A2AError::Validation` - the id is empty
    pub async fn send(&self, params: TaskSendParams) -> A2AResult<Task> {
        let TaskSendParams {
            id,
            session_id,
            message,
            history_length,
            metadata,
        } = params;

        if id.trim().is_empty() {
            return Err(A2AError::Validation("Task id cannot be empty".into()));
        }

        let handle = {
            let mut tasks = self.tasks.write().await;

            if let Some(existing) = tasks.get(&id) {
                return match existing.status {
                    TaskStatus::Completed | TaskStatus::Failed => {
                        debug!(task_id = %id, status = %existing.status, "replaying finished task");
                        Ok(existing.clone().with_history_length(history_length))
                    }
                    status => Err(A2AError::TaskConflict {
                        task_id: id,
                        status: status.to_string(),
                    }),
                };
            }

            let request = ReasoningRequest::from_message(&id, &session_id, &message);
            let mut task = Task::new(&id, session_id, message);
            if let Some(metadata) = metadata {
                task = task.with_metadata(metadata);
            }
            task.start()?;
            tasks.insert(id.clone(), task);
            info!(task_id = %id, "task accepted");

            // Registered before the store lock is released, so `finish` always finds it.
            let handle = tokio::spawn(self.clone().process(request));
            self.inflight
                .lock()
                .await
                .insert(id.clone(), handle.abort_handle());
            handle
        };

        match self.response_deadline {
            Some(deadline) => {
                if tokio::time::timeout(deadline, handle).await.is_err() {
                    debug!(task_id = %id, "task still working at response deadline");
                }
            }
            // An aborted handle means the task was canceled; the store says so.
            None => {
                let _ = handle.await;
            }
        }

        self.snapshot(&id, history_length).await
    }

    /// Fetch a snapshot of a task
    pub async fn get(&self, params: TaskQueryParams) -> A2AResult<Task> {
        self.snapshot(&params.id, params.history_length).await
    }

    /// Cancel a task that has not finished, aborting its reasoning
    ///
    /// # Errors
    ///
    /// * `A2AError::TaskNotFound` - unknown id
    /// * `A2AError::TaskNotCancelable` - the task already finished
    pub async fn cancel(&self, params: TaskIdParams) -> A2AResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&params.id)
            .ok_or_else(|| A2AError::TaskNotFound {
                task_id: params.id.clone(),
            })?;

        task.cancel()?;
        if let Some(handle) = self.inflight.lock().await.remove(&params.id) {
            handle.abort();
        }

        info!(task_id = %params.id, "task canceled");
        Ok(task.clone())
    }

    async fn snapshot(&self, task_id: &str, history_length: Option<usize>) -> A2AResult<Task> {
        let tasks = self.tasks.read().await;
        tasks
            .get(task_id)
            .map(|task| task.clone().with_history_length(history_length))
            .ok_or_else(|| A2AError::TaskNotFound {
                task_id: task_id.to_string(),
            })
    }

    async fn process(self, request: ReasoningRequest) {
        let task_id = request.task_id.clone();
        let reasoning = self.reasoning.clone();

        // The call itself sits inside the future so a panic while building it is caught too.
        let invocation = AssertUnwindSafe(async move { reasoning.reason(request).await })
            .catch_unwind();

        let outcome = match self.reasoning_timeout {
            Some(limit) => tokio::time::timeout(limit, invocation).await.ok(),
            None => Some(invocation.await),
        };

        let settled = match outcome {
            None => Err(TaskError::new(
                REASONING_TIMEOUT,
                format!(
                    "Reasoning did not finish within {:?}",
                    self.reasoning_timeout.unwrap_or_default()
                ),
            )),
            Some(Ok(Ok(output))) if output.is_empty() => Err(TaskError::new(
                REASONING_FAILED,
                "Reasoning produced no usable result",
            )),
            Some(Ok(Ok(output))) => Ok(output.into_message()),
            Some(Ok(Err(err))) => Err(TaskError::new(REASONING_FAILED, err.to_string())),
            Some(Err(panic)) => Err(TaskError::new(REASONING_PANICKED, panic_message(&panic))),
        };

        self.finish(&task_id, settled).await;
    }

    async fn finish(&self, task_id: &str, settled: Result<Message, TaskError>) {
        {
            let mut tasks = self.tasks.write().await;
            if let Some(task) = tasks.get_mut(task_id) {
                if task.is_terminal() {
                    debug!(%task_id, status = %task.status, "discarding outcome of finished task");
                } else {
                    let applied = match settled {
                        Ok(result) => {
                            info!(%task_id, "task completed");
                            task.complete(result)
                        }
                        Err(error) => {
                            warn!(
                                %task_id,
                                code = %error.code,
                                reason = %error.message,
                                "task failed"
                            );
                            task.fail(error)
                        }
                    };
                    if let Err(err) = applied {
                        warn!(%task_id, error = %err, "could not record task outcome");
                    }
                }
            }
        }

        self.inflight.lock().await.remove(task_id);
    }
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("reasoning_timeout", &self.reasoning_timeout)
            .field("response_deadline", &self.response_deadline)
            .finish()
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("Reasoning panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("Reasoning panicked: {}", message)
    } else {
        "Reasoning panicked".to_string()
    }
}
