// Queued Request Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Request ID (UUID v4 in production, injected via IdProvider)
pub type RequestId = String;

/// Priority tier, fixed at enqueue time.
///
/// Variant order is the scheduling order: `Critical` sorts first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All tiers in scheduling order
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Scheduling rank (0 = attempted first)
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(DomainError::UnknownPriority(s.to_string())),
        }
    }
}

/// HTTP method of the queued call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(DomainError::UnknownMethod(s.to_string())),
        }
    }
}

/// Request body (JSON serializable, opaque to the queue)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload(serde_json::Value);

impl RequestPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A pending outbound API call.
///
/// Everything except `retry_count` is fixed once the engine has accepted the
/// request. The engine hands out clones; the copy it owns is only ever
/// mutated by the processing loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    pub id: RequestId,
    pub endpoint: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<RequestPayload>,
    #[serde(default)]
    pub requires_auth: bool,
    pub priority: Priority,
    pub created_at: i64, // epoch ms
    #[serde(default)]
    pub retry_count: u32,
}

impl QueuedRequest {
    /// Build a request from a validated spec
    ///
    /// # Arguments
    ///
    /// * `id` - Unique request ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `spec` - What to call
    pub fn new(id: impl Into<String>, created_at: i64, spec: EnqueueSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            id: id.into(),
            endpoint: spec.endpoint,
            method: spec.method,
            payload: spec.payload,
            requires_auth: spec.requires_auth.unwrap_or(true),
            priority: spec.priority.unwrap_or_default(),
            created_at,
            retry_count: 0,
        })
    }

    /// Age relative to `now_millis`, never negative
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.created_at).max(0)
    }

    /// Record one failed delivery attempt, returns the new count
    pub fn record_failure(&mut self) -> u32 {
        self.retry_count = self.retry_count.saturating_add(1);
        self.retry_count
    }
}

/// Caller-supplied description of a request to enqueue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueSpec {
    pub endpoint: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub payload: Option<RequestPayload>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub requires_auth: Option<bool>,
}

impl EnqueueSpec {
    pub fn new(endpoint: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload: None,
            priority: None,
            requires_auth: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(RequestPayload::new(payload));
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = Some(requires_auth);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(DomainError::EmptyEndpoint);
        }
        Ok(())
    }
}
