// Worker - triggers processing passes

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::processor::{PassOutcome, QueueProcessor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Invokes `process_queue` on a timer and whenever connectivity comes back
///
/// The first tick fires immediately, so a freshly started worker drains
/// whatever the previous session left behind.
pub struct ProcessingWorker {
    processor: Arc<QueueProcessor>,
    interval: Duration,
    connectivity_changes: Option<watch::Receiver<bool>>,
}

impl ProcessingWorker {
    pub fn new(processor: Arc<QueueProcessor>, interval: Duration) -> Self {
        Self {
            processor,
            interval,
            connectivity_changes: None,
        }
    }

    /// Also run a pass each time this channel flips to `true` (online)
    pub fn with_connectivity_changes(mut self, changes: watch::Receiver<bool>) -> Self {
        self.connectivity_changes = Some(changes);
        self
    }

    /// Run until shutdown; an in-flight pass is allowed to finish
    pub async fn run(mut self, mut shutdown: ShutdownToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Processing worker started");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = shutdown.triggered() => {
                    info!("Processing worker interrupted during idle");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_pass("interval").await;
                }
                online = came_online(&mut self.connectivity_changes) => {
                    if online {
                        self.run_pass("connectivity").await;
                        ticker.reset();
                    }
                }
            }
        }

        info!("Processing worker stopped");
    }

    /// One pass, isolated in its own task so a panicking executor can't take the worker down
    ///
    /// Relies on unwinding panics; a `panic = "abort"` profile would end the process.
    async fn run_pass(&self, trigger: &'static str) {
        let processor = Arc::clone(&self.processor);
        let handle = tokio::spawn(async move { processor.process_queue().await });

        match handle.await {
            Ok(report) if report.outcome == PassOutcome::Completed => {
                debug!(
                    trigger = trigger,
                    delivered = report.delivered,
                    retried = report.retried,
                    abandoned = report.abandoned,
                    "Triggered pass finished"
                );
            }
            Ok(report) => {
                debug!(trigger = trigger, outcome = ?report.outcome, "Triggered pass did not run");
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    error!(trigger = trigger, "Processing pass panicked: {:?}", join_err);
                } else {
                    error!(trigger = trigger, "Processing pass cancelled: {:?}", join_err);
                }
            }
        }
    }
}

/// Waits for the next offline -> online transition
///
/// Pending forever when there is no channel or its sender is gone.
async fn came_online(changes: &mut Option<watch::Receiver<bool>>) -> bool {
    match changes {
        Some(rx) => match rx.changed().await {
            Ok(()) => *rx.borrow_and_update(),
            Err(_) => {
                *changes = None;
                false
            }
        },
        None => std::future::pending().await,
    }
}
