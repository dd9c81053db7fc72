//! Validation layer for A2A protocol requests and responses

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower_layer::Layer;
use tower_service::Service;

use crate::{
    protocol::{error::A2AError, operation::A2AOperation, task::TaskStatus},
    service::{A2ARequest, A2AResponse},
};

/// Layer that validates A2A protocol requests and responses
///
/// Requests are always checked before they leave the process. Response
/// checks enforce the task invariants a well-behaved agent keeps and can be
/// switched off for lenient peers.
#[derive(Clone, Debug)]
pub struct A2AValidationLayer {
    validate_responses: bool,
}

impl A2AValidationLayer {
    /// Create a new validation layer
    pub fn new() -> Self {
        Self {
            validate_responses: true,
        }
    }

    /// Enable or disable response validation
    pub fn with_response_validation(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }
}

impl Default for A2AValidationLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for A2AValidationLayer {
    type Service = A2AValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        A2AValidationService {
            inner,
            validate_responses: self.validate_responses,
        }
    }
}

/// Validation service that wraps an inner service
#[derive(Clone)]
pub struct A2AValidationService<S> {
    inner: S,
    validate_responses: bool,
}

impl<S> A2AValidationService<S> {
    /// Validate an A2A request
    fn validate_request(req: &A2ARequest) -> Result<(), A2AError> {
        if let Some(task_id) = req.operation.task_id() {
            if task_id.trim().is_empty() {
                return Err(A2AError::Validation("Task ID cannot be empty".into()));
            }
        }

        if let A2AOperation::SendTask(params) = &req.operation {
            if params.message.parts.is_empty() {
                return Err(A2AError::Validation(
                    "Message must have at least one part".into(),
                ));
            }
        }

        if req.context.request_id.is_empty() {
            return Err(A2AError::Validation("Request ID cannot be empty".into()));
        }

        Ok(())
    }

    /// Validate an A2A response against the request that produced it
    fn validate_response(operation: &A2AOperation, resp: &A2AResponse) -> Result<(), A2AError> {
        match resp {
            A2AResponse::Task(task) => {
                if let Some(expected) = operation.task_id() {
                    if task.id != expected {
                        return Err(A2AError::Validation(format!(
                            "Agent answered with task {} for task {}",
                            task.id, expected
                        )));
                    }
                }

                if task.status == TaskStatus::Completed && task.result.is_none() {
                    return Err(A2AError::Validation(
                        "Completed task must have a result".into(),
                    ));
                }

                if task.status == TaskStatus::Failed && task.error.is_none() {
                    return Err(A2AError::Validation(
                        "Failed task must have an error".into(),
                    ));
                }
            }
            A2AResponse::AgentCard(card) => card.validate()?,
            A2AResponse::Empty => {
                if operation.rpc_method().is_some() {
                    return Err(A2AError::Validation(
                        "Task operation returned no task".into(),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl<S> Service<A2ARequest> for A2AValidationService<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        if let Err(e) = Self::validate_request(&req) {
            return Box::pin(async move { Err(e) });
        }

        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let validate_responses = self.validate_responses;
        let operation = req.operation.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            if validate_responses {
                Self::validate_response(&operation, &response)?;
            }

            Ok(response)
        })
    }
}
