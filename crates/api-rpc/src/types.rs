//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use offline_queue_core::domain::{Priority, QueueStats, QueuedRequest};
use serde::{Deserialize, Serialize};

/// queue.enqueue.v1 - Queue an API call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub endpoint: String,
    /// `GET`, `POST`, `PUT`, `PATCH` or `DELETE` (case-insensitive)
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// `critical`, `high`, `medium` (default) or `low`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub id: String,
    pub priority: Priority,
    pub queue_size: usize,
}

/// queue.remove.v1 - Drop a queued call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub id: String,
    pub removed: bool,
}

/// queue.clear.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// queue.list.v1 - Filters are exclusive; `priority` wins when both are set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub requests: Vec<QueuedRequest>,
}

/// queue.stats.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub size: usize,
    pub stats: QueueStats,
    pub oldest: Option<QueuedRequest>,
    pub newest: Option<QueuedRequest>,
}

/// queue.cleanup.v1
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub removed: usize,
}
