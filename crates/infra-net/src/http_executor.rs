// HTTP request executor
use async_trait::async_trait;
use offline_queue_core::domain::{HttpMethod, QueuedRequest};
use offline_queue_core::error::{AppError, Result};
use offline_queue_core::port::{ExecutionError, ExecutionResult, RequestExecutor, TimeProvider};
use reqwest::{Client, Method};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Where and how queued requests are sent
#[derive(Debug, Clone)]
pub struct HttpExecutorConfig {
    /// Prefix for relative endpoints, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// Bearer token for requests with `requires_auth`
    pub auth_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpExecutorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Replays queued requests against the backend over HTTP
///
/// Any 2xx response is a delivery. Everything else (transport error,
/// timeout, non-2xx status, missing token) is a failed attempt.
pub struct HttpRequestExecutor {
    client: Client,
    base_url: String,
    auth_token: RwLock<Option<String>>,
    timeout: Duration,
    time_provider: Arc<dyn TimeProvider>,
}

impl HttpRequestExecutor {
    /// Create a new HTTP executor
    ///
    /// # Errors
    /// `AppError::Config` if the underlying client cannot be built
    pub fn new(config: HttpExecutorConfig, time_provider: Arc<dyn TimeProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("offline-queue/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            auth_token: RwLock::new(config.auth_token),
            timeout: config.timeout,
            time_provider,
        })
    }

    /// Replace the bearer token (login, refresh) or drop it (logout)
    pub fn set_auth_token(&self, token: Option<String>) {
        match self.auth_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn current_token(&self) -> Option<String> {
        match self.auth_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Absolute URL for an endpoint
    fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn timeout_ms(&self) -> i64 {
        i64::try_from(self.timeout.as_millis()).unwrap_or(i64::MAX)
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl RequestExecutor for HttpRequestExecutor {
    async fn execute(
        &self,
        request: &QueuedRequest,
    ) -> std::result::Result<ExecutionResult, ExecutionError> {
        let url = self.resolve_url(&request.endpoint);
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url.as_str());

        if request.requires_auth {
            let token = self.current_token().ok_or_else(|| {
                ExecutionError::Unauthorized(format!("no auth token for request {}", request.id))
            })?;
            builder = builder.bearer_auth(token);
        }

        if request.method != HttpMethod::Get {
            if let Some(payload) = &request.payload {
                builder = builder.json(payload.as_value());
            }
        }

        let start = self.time_provider.now_millis();
        debug!(request_id = %request.id, method = %request.method, url = %url, "Sending queued request");

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ExecutionError::Timeout(self.timeout_ms())
            } else if e.is_builder() {
                ExecutionError::InvalidRequest(e.to_string())
            } else {
                ExecutionError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let duration_ms = self.time_provider.now_millis() - start;

        if !status.is_success() {
            warn!(
                request_id = %request.id,
                url = %url,
                status = status.as_u16(),
                "Queued request rejected by server"
            );
            return Err(ExecutionError::Status(status.as_u16()));
        }

        debug!(
            request_id = %request.id,
            status = status.as_u16(),
            duration_ms = duration_ms,
            "Queued request delivered"
        );
        Ok(ExecutionResult {
            status_code: Some(status.as_u16()),
            duration_ms,
        })
    }
}
