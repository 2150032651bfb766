// Processing loop - drains the queue against the network

use crate::application::queue::QueueEngine;
use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::port::{ConnectivityOracle, RequestExecutor};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a processing pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Connectivity oracle declined; nothing was touched
    Offline,
    /// Another pass was still running; nothing was touched
    AlreadyRunning,
    /// Every queued request was considered once
    Completed,
}

/// Summary of one `process_queue` invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub outcome: PassOutcome,
    pub attempted: usize,
    pub delivered: usize,
    pub retried: usize,
    pub abandoned: usize,
    /// Requests removed by a producer before their turn came
    pub skipped: usize,
}

impl ProcessReport {
    fn new(outcome: PassOutcome) -> Self {
        Self {
            outcome,
            attempted: 0,
            delivered: 0,
            retried: 0,
            abandoned: 0,
            skipped: 0,
        }
    }
}

/// Drives queued requests through the retry state machine
///
/// `Queued -> Processing -> Delivered | PendingRetry | Abandoned`.
/// Requests are attempted one at a time in scheduling order. The engine
/// lock is only taken to settle each outcome, so producers can keep
/// enqueuing while a slow call is in flight.
pub struct QueueProcessor {
    engine: Arc<QueueEngine>,
    connectivity: Arc<dyn ConnectivityOracle>,
    executor: Arc<dyn RequestExecutor>,
    retry_policy: RetryPolicy,
    in_flight: AtomicBool,
}

impl QueueProcessor {
    pub fn new(
        engine: Arc<QueueEngine>,
        connectivity: Arc<dyn ConnectivityOracle>,
        executor: Arc<dyn RequestExecutor>,
    ) -> Self {
        let retry_policy = RetryPolicy::new(engine.config().max_retries);
        Self {
            engine,
            connectivity,
            executor,
            retry_policy,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &Arc<QueueEngine> {
        &self.engine
    }

    /// Run one processing pass
    ///
    /// Never fails: per-request failures are absorbed by the retry counter.
    /// The queue is persisted once, after the whole pass.
    pub async fn process_queue(&self) -> ProcessReport {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Processing pass already running, skipping");
            return ProcessReport::new(PassOutcome::AlreadyRunning);
        }
        let _in_flight = InFlight(&self.in_flight);

        if !self.connectivity.should_attempt_network_operation().await {
            debug!("Network attempts not allowed, leaving queue untouched");
            return ProcessReport::new(PassOutcome::Offline);
        }

        let pending = self.engine.get_queue().await;
        let mut report = ProcessReport::new(PassOutcome::Completed);

        for request in pending {
            if !self.engine.contains(&request.id).await {
                report.skipped += 1;
                continue;
            }

            report.attempted += 1;
            match self.executor.execute(&request).await {
                Ok(result) => {
                    report.delivered += 1;
                    if !self.engine.settle_delivered(&request.id).await {
                        debug!(request_id = %request.id, "Delivered request was already removed");
                    }
                    debug!(
                        request_id = %request.id,
                        status = ?result.status_code,
                        duration_ms = result.duration_ms,
                        "Request delivered"
                    );
                }
                Err(e) => {
                    warn!(
                        request_id = %request.id,
                        endpoint = %request.endpoint,
                        error = %e,
                        "Request attempt failed"
                    );
                    match self
                        .engine
                        .settle_failure(&request.id, &self.retry_policy)
                        .await
                    {
                        Some(RetryDecision::Retry { .. }) => report.retried += 1,
                        Some(RetryDecision::Abandon { .. }) => report.abandoned += 1,
                        None => {
                            debug!(request_id = %request.id, "Failed request was already removed")
                        }
                    }
                }
            }
        }

        self.engine.persist().await;

        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            retried = report.retried,
            abandoned = report.abandoned,
            skipped = report.skipped,
            "Processing pass completed"
        );
        report
    }
}

/// Clears the in-flight flag when the pass ends, including on panic
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
