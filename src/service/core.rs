//! Core A2A protocol service implementation

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tower_service::Service;
use tracing::{debug, Instrument};

use crate::{
    codec::{Codec, JsonRpcResponse},
    protocol::{error::A2AError, operation::A2AOperation},
    service::{A2ARequest, A2AResponse},
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Core A2A protocol service that wraps a transport
///
/// This service implements the Tower `Service` trait and provides the core logic
/// for executing A2A operations over any transport. Connectivity failures and
/// request timeouts come back as [`A2AError::Transport`]; errors the agent
/// reported in the JSON-RPC error slot come back as their typed variants.
pub struct A2AProtocolService<T> {
    transport: T,
    codec: Arc<dyn Codec>,
}

impl<T> A2AProtocolService<T>
where
    T: Transport,
{
    /// Create a new A2A protocol service
    ///
    /// # Arguments
    ///
    /// * `transport` - The underlying transport implementation
    /// * `codec` - The codec for serialization/deserialization
    pub fn new(transport: T, codec: Arc<dyn Codec>) -> Self {
        Self { transport, codec }
    }

    /// Build a transport request from an A2A operation
    fn build_transport_request(
        req: &A2ARequest,
        codec: &dyn Codec,
    ) -> Result<TransportRequest, A2AError> {
        let method = req.operation.method();

        let mut transport_req = TransportRequest::new(req.operation.endpoint(), method)
            .header("Accept", codec.content_type());

        for (key, value) in &req.context.metadata {
            transport_req = transport_req.header(key.clone(), value.clone());
        }

        let body = codec.encode_request(&req.operation, &req.context.request_id)?;
        if !body.is_empty() && method != "GET" {
            transport_req = transport_req
                .header("Content-Type", codec.content_type())
                .body(body);
        }

        Ok(transport_req)
    }

    /// Parse a transport response into an A2A response
    fn parse_transport_response(
        transport_resp: TransportResponse,
        codec: &dyn Codec,
        req: &A2ARequest,
    ) -> Result<A2AResponse, A2AError> {
        if !transport_resp.is_success() {
            return Err(Self::handle_error_response(&transport_resp, &req.operation));
        }

        codec.decode_response(&transport_resp.body, &req.operation, &req.context.request_id)
    }

    /// Handle non-2xx responses from the transport
    ///
    /// A JSON-RPC error body is still an answer from the agent; anything else
    /// means the endpoint is not speaking the protocol.
    fn handle_error_response(
        transport_resp: &TransportResponse,
        operation: &A2AOperation,
    ) -> A2AError {
        if let Ok(envelope) = serde_json::from_slice::<JsonRpcResponse>(&transport_resp.body) {
            if let Some(error) = envelope.error {
                return error.into_a2a_error(operation.task_id());
            }
        }

        A2AError::Transport(format!("HTTP error: {}", transport_resp.status))
    }
}

impl<T> Service<A2ARequest> for A2AProtocolService<T>
where
    T: Transport + Clone,
{
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.transport.poll_ready(cx)
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        let transport = self.transport.clone();
        let codec = self.codec.clone();
        let span = tracing::debug_span!(
            "a2a_call",
            agent = %transport.base_url(),
            method = req.operation.rpc_method().unwrap_or("discover"),
            request_id = %req.context.request_id,
        );

        Box::pin(
            async move {
                let transport_req = Self::build_transport_request(&req, codec.as_ref())?;

                let exchange = transport.execute(transport_req);
                let transport_resp = match req.context.timeout {
                    Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                        A2AError::Transport(format!("Request timed out after {:?}", limit))
                    })??,
                    None => exchange.await?,
                };
                debug!(status = transport_resp.status, "agent responded");

                Self::parse_transport_response(transport_resp, codec.as_ref(), &req)
            }
            .instrument(span),
        )
    }
}

impl<T> Clone for A2AProtocolService<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            codec: self.codec.clone(),
        }
    }
}
