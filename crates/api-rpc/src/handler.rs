//! RPC Method Handlers
//!
//! Thin adapters from RPC params to `QueueEngine` / `QueueProcessor` calls.

use crate::error::to_rpc_error;
use crate::types::{
    CleanupRequest, CleanupResponse, ClearResponse, EnqueueRequest, EnqueueResponse,
    ListRequest, ListResponse, RemoveRequest, RemoveResponse, StatsResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use offline_queue_core::application::worker::constants::DEFAULT_MAX_REQUEST_AGE;
use offline_queue_core::application::{ProcessReport, QueueEngine, QueueProcessor};
use offline_queue_core::domain::{EnqueueSpec, HttpMethod, Priority};
use offline_queue_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    engine: Arc<QueueEngine>,
    processor: Arc<QueueProcessor>,
}

impl RpcHandler {
    pub fn new(engine: Arc<QueueEngine>, processor: Arc<QueueProcessor>) -> Self {
        Self { engine, processor }
    }

    /// queue.enqueue.v1
    pub async fn enqueue(
        &self,
        params: EnqueueRequest,
    ) -> Result<EnqueueResponse, ErrorObjectOwned> {
        let method: HttpMethod = params
            .method
            .parse()
            .map_err(|e| to_rpc_error(AppError::Domain(e)))?;

        let mut spec = EnqueueSpec::new(params.endpoint, method);
        if let Some(payload) = params.payload {
            spec = spec.with_payload(payload);
        }
        if let Some(priority) = params.priority {
            let priority: Priority = priority
                .parse()
                .map_err(|e| to_rpc_error(AppError::Domain(e)))?;
            spec = spec.with_priority(priority);
        }
        if let Some(requires_auth) = params.requires_auth {
            spec = spec.with_requires_auth(requires_auth);
        }
        let priority = spec.priority.unwrap_or_default();

        let id = self.engine.enqueue(spec).await.map_err(to_rpc_error)?;

        Ok(EnqueueResponse {
            id,
            priority,
            queue_size: self.engine.get_queue_size().await,
        })
    }

    /// queue.remove.v1
    pub async fn remove(&self, params: RemoveRequest) -> Result<RemoveResponse, ErrorObjectOwned> {
        let removed = self.engine.remove(&params.id).await;
        Ok(RemoveResponse {
            id: params.id,
            removed,
        })
    }

    /// queue.clear.v1
    pub async fn clear(&self) -> Result<ClearResponse, ErrorObjectOwned> {
        let cleared = self.engine.clear().await;
        Ok(ClearResponse { cleared })
    }

    /// queue.list.v1
    pub async fn list(&self, params: ListRequest) -> Result<ListResponse, ErrorObjectOwned> {
        let requests = match (params.priority, params.endpoint_prefix) {
            (Some(priority), _) => {
                let priority: Priority = priority
                    .parse()
                    .map_err(|e| to_rpc_error(AppError::Domain(e)))?;
                self.engine.get_requests_by_priority(priority).await
            }
            (None, Some(prefix)) => self.engine.get_requests_by_endpoint(&prefix).await,
            (None, None) => self.engine.get_queue().await,
        };
        Ok(ListResponse { requests })
    }

    /// queue.stats.v1
    pub async fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        Ok(StatsResponse {
            size: self.engine.get_queue_size().await,
            stats: self.engine.get_stats().await,
            oldest: self.engine.get_oldest_request().await,
            newest: self.engine.get_newest_request().await,
        })
    }

    /// queue.process.v1 - Manual trigger
    pub async fn process(&self) -> Result<ProcessReport, ErrorObjectOwned> {
        let report = self.processor.process_queue().await;
        info!(outcome = ?report.outcome, delivered = report.delivered, "Manual processing pass");
        Ok(report)
    }

    /// queue.cleanup.v1
    pub async fn cleanup(
        &self,
        params: CleanupRequest,
    ) -> Result<CleanupResponse, ErrorObjectOwned> {
        let max_age = params
            .max_age_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_MAX_REQUEST_AGE);
        let removed = self.engine.cleanup_old_requests(max_age).await;
        Ok(CleanupResponse { removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use offline_queue_core::application::PassOutcome;
    use offline_queue_core::domain::QueueConfig;
    use offline_queue_core::port::connectivity::mocks::StaticConnectivity;
    use offline_queue_core::port::id_provider::mocks::SequentialIdProvider;
    use offline_queue_core::port::key_value_store::mocks::InMemoryStore;
    use offline_queue_core::port::request_executor::mocks::MockRequestExecutor;
    use offline_queue_core::port::time_provider::mocks::ManualTimeProvider;

    fn handler() -> (RpcHandler, Arc<ManualTimeProvider>, Arc<MockRequestExecutor>) {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let engine = Arc::new(QueueEngine::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SequentialIdProvider::new()),
            clock.clone(),
            QueueConfig::default(),
        ));
        let executor = Arc::new(MockRequestExecutor::new_success());
        let processor = Arc::new(QueueProcessor::new(
            engine.clone(),
            Arc::new(StaticConnectivity::online()),
            executor.clone(),
        ));
        (RpcHandler::new(engine, processor), clock, executor)
    }

    fn enqueue_params(endpoint: &str, priority: Option<&str>) -> EnqueueRequest {
        EnqueueRequest {
            endpoint: endpoint.to_string(),
            method: "post".to_string(),
            payload: Some(serde_json::json!({"n": 1})),
            priority: priority.map(str::to_string),
            requires_auth: None,
        }
    }

    #[tokio::test]
    async fn test_enqueue_defaults_to_medium() {
        let (handler, _, _) = handler();
        let resp = handler.enqueue(enqueue_params("/a", None)).await.unwrap();

        assert_eq!(resp.id, "req-1");
        assert_eq!(resp.priority, Priority::Medium);
        assert_eq!(resp.queue_size, 1);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_bad_input() {
        let (handler, _, _) = handler();

        let err = handler.enqueue(enqueue_params("  ", None)).await.unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);

        let err = handler
            .enqueue(enqueue_params("/a", Some("urgent")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);

        let mut params = enqueue_params("/a", None);
        params.method = "TRACE".to_string();
        let err = handler.enqueue(params).await.unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (handler, _, _) = handler();
        handler.enqueue(enqueue_params("/users/1", Some("low"))).await.unwrap();
        handler.enqueue(enqueue_params("/orders/9", Some("critical"))).await.unwrap();

        let all = handler.list(ListRequest::default()).await.unwrap();
        let endpoints: Vec<_> = all.requests.iter().map(|r| r.endpoint.as_str()).collect();
        assert_eq!(endpoints, vec!["/orders/9", "/users/1"]);

        let low = handler
            .list(ListRequest {
                priority: Some("LOW".to_string()),
                endpoint_prefix: None,
            })
            .await
            .unwrap();
        assert_eq!(low.requests.len(), 1);

        let users = handler
            .list(ListRequest {
                priority: None,
                endpoint_prefix: Some("/users".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(users.requests[0].endpoint, "/users/1");
    }

    #[tokio::test]
    async fn test_remove_clear_and_stats() {
        let (handler, _, _) = handler();
        let first = handler.enqueue(enqueue_params("/a", None)).await.unwrap();
        handler.enqueue(enqueue_params("/b", None)).await.unwrap();
        handler.enqueue(enqueue_params("/c", None)).await.unwrap();

        assert!(handler.remove(RemoveRequest { id: first.id.clone() }).await.unwrap().removed);
        assert!(!handler.remove(RemoveRequest { id: first.id }).await.unwrap().removed);

        let stats = handler.stats().await.unwrap();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.stats.by_priority[&Priority::Medium], 2);
        assert_eq!(stats.oldest.map(|r| r.endpoint), Some("/b".to_string()));

        assert_eq!(handler.clear().await.unwrap().cleared, 2);
        assert!(handler.stats().await.unwrap().newest.is_none());
    }

    #[tokio::test]
    async fn test_process_and_cleanup() {
        let (handler, clock, executor) = handler();
        handler.enqueue(enqueue_params("/a", None)).await.unwrap();

        let report = handler.process().await.unwrap();
        assert_eq!(report.outcome, PassOutcome::Completed);
        assert_eq!(report.delivered, 1);
        assert_eq!(executor.call_count(), 1);

        handler.enqueue(enqueue_params("/b", None)).await.unwrap();
        clock.advance(2 * 3_600_000);

        let kept = handler
            .cleanup(CleanupRequest {
                max_age_secs: Some(3 * 3600),
            })
            .await
            .unwrap();
        assert_eq!(kept.removed, 0);

        let removed = handler
            .cleanup(CleanupRequest {
                max_age_secs: Some(3600),
            })
            .await
            .unwrap();
        assert_eq!(removed.removed, 1);
    }
}
