// Queue Engine - owns the pending request list and its persisted snapshot

pub mod snapshot;


use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::application::worker::constants::MAX_ID_ATTEMPTS;
use crate::domain::{
    sort_for_schedule, EnqueueSpec, Priority, QueueConfig, QueueStats, QueuedRequest, RequestId,
};
use crate::error::Result;
use crate::port::{IdProvider, KeyValueStore, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Durable, bounded, priority-ordered queue of outbound requests
///
/// Items are kept in insertion order; reads that return several items use
/// scheduling order (priority, then age). Every mutation persists the full
/// queue while still holding the write lock, so snapshots reach the store in
/// mutation order. A failed write is logged and the in-memory state stays
/// authoritative for the session.
pub struct QueueEngine {
    items: RwLock<Vec<QueuedRequest>>,
    store: Arc<dyn KeyValueStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: QueueConfig,
}

impl QueueEngine {
    /// Create an empty engine; call [`QueueEngine::initialize`] to load the
    /// previous session's snapshot
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: QueueConfig,
    ) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            store,
            id_provider,
            time_provider,
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Load the queue from the store
    ///
    /// Never fails: a missing, unreadable or malformed snapshot yields an
    /// empty queue. Returns the number of loaded items.
    pub async fn initialize(&self) -> usize {
        let key = self.config.storage_key.as_str();

        let (loaded, repaired) = match self.store.get(key).await {
            Ok(Some(bytes)) => match snapshot::decode(&bytes) {
                Ok(items) => snapshot::repair(items, self.capacity()),
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored queue is malformed, starting empty");
                    (Vec::new(), false)
                }
            },
            Ok(None) => {
                debug!(key = %key, "No stored queue, starting empty");
                (Vec::new(), false)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored queue, starting empty");
                (Vec::new(), false)
            }
        };

        let mut items = self.items.write().await;
        *items = loaded;
        if repaired {
            self.persist_locked(&items).await;
        }

        info!(key = %key, loaded = items.len(), "Offline queue initialized");
        items.len()
    }

    /// Append a request and return its id
    ///
    /// Fails only when the enqueue request is invalid (empty endpoint). When the queue
    /// overflows, the oldest items by insertion are evicted regardless of
    /// priority.
    pub async fn enqueue(&self, spec: EnqueueSpec) -> Result<RequestId> {
        spec.validate()?;

        let mut items = self.items.write().await;
        let id = self.fresh_id(&items);
        let request = QueuedRequest::new(id.clone(), self.time_provider.now_millis(), spec)?;

        debug!(
            request_id = %request.id,
            endpoint = %request.endpoint,
            method = %request.method,
            priority = %request.priority,
            "Enqueued request"
        );

        items.push(request);
        self.evict_overflow(&mut items);
        self.persist_locked(&items).await;

        Ok(id)
    }

    /// Remove a request by id, returns whether anything was removed
    pub async fn remove(&self, id: &str) -> bool {
        let mut items = self.items.write().await;
        let Some(index) = items.iter().position(|item| item.id == id) else {
            return false;
        };

        items.remove(index);
        self.persist_locked(&items).await;
        debug!(request_id = %id, "Removed request");
        true
    }

    /// Drop every request and persist the empty queue, returns how many were dropped
    pub async fn clear(&self) -> usize {
        let mut items = self.items.write().await;
        let cleared = items.len();
        items.clear();
        self.persist_locked(&items).await;
        info!(cleared = cleared, "Offline queue cleared");
        cleared
    }

    /// All requests in scheduling order
    pub async fn get_queue(&self) -> Vec<QueuedRequest> {
        let mut snapshot = self.items.read().await.clone();
        sort_for_schedule(&mut snapshot);
        snapshot
    }

    pub async fn get_queue_size(&self) -> usize {
        self.items.read().await.len()
    }

    /// Requests of one tier, in scheduling order
    pub async fn get_requests_by_priority(&self, priority: Priority) -> Vec<QueuedRequest> {
        let mut matching: Vec<QueuedRequest> = self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.priority == priority)
            .cloned()
            .collect();
        sort_for_schedule(&mut matching);
        matching
    }

    /// Requests whose endpoint starts with `prefix`, in scheduling order
    pub async fn get_requests_by_endpoint(&self, prefix: &str) -> Vec<QueuedRequest> {
        let mut matching: Vec<QueuedRequest> = self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.endpoint.starts_with(prefix))
            .cloned()
            .collect();
        sort_for_schedule(&mut matching);
        matching
    }

    /// Request with the smallest `created_at` (earliest inserted on ties)
    pub async fn get_oldest_request(&self) -> Option<QueuedRequest> {
        self.items
            .read()
            .await
            .iter()
            .min_by_key(|item| item.created_at)
            .cloned()
    }

    /// Request with the largest `created_at` (latest inserted on ties)
    pub async fn get_newest_request(&self) -> Option<QueuedRequest> {
        self.items
            .read()
            .await
            .iter()
            .max_by_key(|item| item.created_at)
            .cloned()
    }

    pub async fn get_stats(&self) -> QueueStats {
        let items = self.items.read().await;
        QueueStats::collect(&items, self.time_provider.now_millis())
    }

    /// Remove every request older than `max_age`, returns the removed count
    ///
    /// Age is measured from `created_at`; priority and attempt history are
    /// ignored. Nothing is written when nothing expired.
    pub async fn cleanup_old_requests(&self, max_age: Duration) -> usize {
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let now = self.time_provider.now_millis();

        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.age_millis(now) <= max_age_ms);
        let removed = before - items.len();

        if removed > 0 {
            self.persist_locked(&items).await;
            info!(
                removed = removed,
                max_age_ms = max_age_ms,
                remaining = items.len(),
                "Expired requests removed"
            );
        }
        removed
    }

    // ------------------------------------------------------------------
    // Processing-loop hooks: settle one attempt without persisting; the
    // processor persists once per pass.
    // ------------------------------------------------------------------

    pub(crate) async fn contains(&self, id: &str) -> bool {
        self.items.read().await.iter().any(|item| item.id == id)
    }

    /// Drop a delivered request, false if it was already gone
    pub(crate) async fn settle_delivered(&self, id: &str) -> bool {
        let mut items = self.items.write().await;
        match items.iter().position(|item| item.id == id) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Count a failed attempt; `None` if the request is no longer queued
    pub(crate) async fn settle_failure(
        &self,
        id: &str,
        policy: &RetryPolicy,
    ) -> Option<RetryDecision> {
        let mut items = self.items.write().await;
        let index = items.iter().position(|item| item.id == id)?;

        let decision = policy.record_failure(&mut items[index]);
        if let RetryDecision::Abandon { .. } = decision {
            items.remove(index);
        }
        Some(decision)
    }

    /// Write the current queue to the store
    pub(crate) async fn persist(&self) -> bool {
        let items = self.items.write().await;
        self.persist_locked(&items).await
    }

    // ------------------------------------------------------------------

    fn capacity(&self) -> usize {
        self.config.max_queue_size.max(1)
    }

    fn fresh_id(&self, items: &[QueuedRequest]) -> RequestId {
        let taken = |candidate: &str| items.iter().any(|item| item.id == candidate);

        let mut id = self.id_provider.generate_id();
        for _ in 1..MAX_ID_ATTEMPTS {
            if !taken(&id) {
                return id;
            }
            id = self.id_provider.generate_id();
        }

        // Provider keeps colliding, disambiguate with a suffix
        let base = id;
        let mut suffix = 1u32;
        let mut candidate = format!("{}-{}", base, suffix);
        while taken(&candidate) {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }
        warn!(request_id = %candidate, "Id provider collided, using suffixed id");
        candidate
    }

    fn evict_overflow(&self, items: &mut Vec<QueuedRequest>) {
        let overflow = items.len().saturating_sub(self.capacity());
        if overflow == 0 {
            return;
        }
        for evicted in items.drain(..overflow) {
            warn!(
                request_id = %evicted.id,
                priority = %evicted.priority,
                endpoint = %evicted.endpoint,
                "Queue at capacity, evicted oldest request"
            );
        }
    }

    async fn persist_locked(&self, items: &[QueuedRequest]) -> bool {
        let bytes = match snapshot::encode(items) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode queue snapshot");
                return false;
            }
        };

        match self.store.set(&self.config.storage_key, &bytes).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    key = %self.config.storage_key,
                    size = items.len(),
                    error = %e,
                    "Failed to persist queue, keeping in-memory state"
                );
                false
            }
        }
    }
}
