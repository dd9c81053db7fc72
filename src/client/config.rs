//! Client configuration

use std::time::Duration;

/// Configuration for an A2A client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout applied to every single request (send, get, discovery)
    pub timeout: Duration,

    /// Enable response validation
    pub validate_responses: bool,
}

impl ClientConfig {
    /// Create a new client configuration with defaults
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            validate_responses: true,
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable response validation
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How a connector delegates one instruction to a remote agent
///
/// `timeout` bounds the whole delegation, send plus polling. Elapsing it is
/// reported as [`crate::protocol::A2AError::Timeout`], never as a failure.
#[derive(Debug, Clone)]
pub struct DelegationPolicy {
    /// Overall deadline for one delegation
    pub timeout: Duration,

    /// Pause between `tasks/get` polls while the task is not terminal
    pub poll_interval: Duration,

    /// How many times `tasks/send` is attempted after connectivity failures
    pub send_attempts: u32,
}

impl DelegationPolicy {
    /// Create a policy with defaults (60s timeout, 500ms poll interval, 2 send attempts)
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            send_attempts: 2,
        }
    }

    /// Set the overall delegation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the number of send attempts (at least one is always made)
    pub fn with_send_attempts(mut self, send_attempts: u32) -> Self {
        self.send_attempts = send_attempts.max(1);
        self
    }
}

impl Default for DelegationPolicy {
    fn default() -> Self {
        Self::new()
    }
}
