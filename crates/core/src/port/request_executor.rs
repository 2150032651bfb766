// Request Executor Port
// Abstraction for performing one queued API call over the network

use crate::domain::QueuedRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Result of a successful call
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status_code: Option<u16>,
    pub duration_ms: i64,
}

/// Execution errors
///
/// The processing loop treats every variant the same way (one failed
/// attempt); the variants exist for logging.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(i64),

    #[error("Server responded with HTTP {0}")]
    Status(u16),

    #[error("Authentication unavailable: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Request Executor trait
///
/// Implementations:
/// - HttpRequestExecutor: reqwest against the backend base URL
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Perform the call described by `request`
    /// (`endpoint`, `method`, `payload`, `requires_auth`)
    ///
    /// # Errors
    /// Any failure: transport, timeout, non-success status, missing credentials
    async fn execute(&self, request: &QueuedRequest) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::RequestId;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with message
        Fail(String),
        /// Report a timeout of N ms
        Timeout(i64),
    }

    /// Mock Request Executor for testing
    pub struct MockRequestExecutor {
        behavior: MockBehavior,
        failing_endpoints: Mutex<HashSet<String>>,
        delay: Mutex<Option<Duration>>,
        calls: Mutex<Vec<RequestId>>,
    }

    impl MockRequestExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                failing_endpoints: Mutex::new(HashSet::new()),
                delay: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }
        /// Fail calls to `endpoint` regardless of the base behavior
        pub fn fail_endpoint(&self, endpoint: impl Into<String>) {
            self.failing_endpoints.lock().unwrap().insert(endpoint.into());
        }
        /// Hold every call for `delay` before answering
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
        /// IDs in the order they were executed
        pub fn calls(&self) -> Vec<RequestId> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RequestExecutor for MockRequestExecutor {
        async fn execute(
            &self,
            request: &QueuedRequest,
        ) -> Result<ExecutionResult, ExecutionError> {
            self.calls.lock().unwrap().push(request.id.clone());

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self
                .failing_endpoints
                .lock()
                .unwrap()
                .contains(&request.endpoint)
            {
                return Err(ExecutionError::Status(503));
            }

            match &self.behavior {
                MockBehavior::Success => Ok(ExecutionResult {
                    status_code: Some(200),
                    duration_ms: 5,
                }),
                MockBehavior::Fail(msg) => Err(ExecutionError::Network(msg.clone())),
                MockBehavior::Timeout(ms) => Err(ExecutionError::Timeout(*ms)),
            }
        }
    }
}
