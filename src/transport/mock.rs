use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use async_trait::async_trait;
use url::Url;

use crate::{
    protocol::error::A2AError,
    transport::{Transport, TransportRequest, TransportResponse},
};

type Handler = dyn Fn(TransportRequest) -> Result<TransportResponse, A2AError> + Send + Sync;

/// Mock transport for internal testing
///
/// Answers every request with a closure so unit tests can script agent
/// replies (including connectivity failures) without a network.
#[derive(Clone)]
pub(crate) struct MockTransport {
    handler: Arc<Handler>,
    calls: Arc<AtomicUsize>,
    base_url: Url,
}

impl MockTransport {
    /// Create a new mock transport with a custom request handler
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(TransportRequest) -> TransportResponse + Send + Sync + 'static,
    {
        Self::fallible(move |req| Ok(handler(req)))
    }

    /// Create a mock transport whose handler may fail at the transport level
    pub fn fallible<F>(handler: F) -> Self
    where
        F: Fn(TransportRequest) -> Result<TransportResponse, A2AError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(AtomicUsize::new(0)),
            base_url: Url::parse("http://mock.agent/").expect("static url"),
        }
    }

    /// Number of requests executed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), A2AError>> {
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(request)
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport").finish()
    }
}
