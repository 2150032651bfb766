// Maintenance - scheduled expiry of stale requests

use crate::application::queue::QueueEngine;
use crate::application::worker::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Cleanup scheduler
///
/// Periodically drops requests older than `max_age` so a device that stays
/// offline for days doesn't replay stale writes when it reconnects.
pub struct CleanupScheduler {
    engine: Arc<QueueEngine>,
    max_age: Duration,
    interval: Duration,
}

impl CleanupScheduler {
    /// Create a new cleanup scheduler
    ///
    /// # Arguments
    /// * `engine` - Queue to sweep
    /// * `max_age` - Requests older than this are removed (default: 24h)
    /// * `interval` - How often to sweep (default: 1h)
    pub fn new(engine: Arc<QueueEngine>, max_age: Duration, interval: Duration) -> Self {
        Self {
            engine,
            max_age,
            interval,
        }
    }

    /// Run the sweep loop until shutdown
    ///
    /// The first sweep runs immediately.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            max_age_secs = self.max_age.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Cleanup scheduler started"
        );

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = tick.tick() => {
                    self.run_now().await;
                }
            }
        }

        info!("Cleanup scheduler stopped");
    }

    /// Sweep immediately, returns the number of removed requests
    pub async fn run_now(&self) -> usize {
        let removed = self.engine.cleanup_old_requests(self.max_age).await;
        if removed == 0 {
            debug!("Cleanup sweep found nothing to expire");
        }
        removed
    }
}
