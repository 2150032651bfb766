// Retry accounting for failed delivery attempts
use crate::domain::QueuedRequest;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep the request for a later pass
    Retry { attempt: u32, remaining: u32 },
    /// Attempts exhausted, the request is dropped
    Abandon { attempts: u32 },
}

/// Retry policy
///
/// A request may fail `max_retries` times and stay queued; the failure after
/// that (attempt `max_retries + 1`) abandons it. There is no per-item delay:
/// a retained request is attempted again on the next processing pass.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_retries` - Failed attempts tolerated before abandoning (default: 3)
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Count one failed attempt against `request` and decide its fate
    ///
    /// # Example
    /// ```text
    /// match policy.record_failure(&mut request) {
    ///     RetryDecision::Retry { attempt, .. } => println!("will retry, {} failures so far", attempt),
    ///     RetryDecision::Abandon { attempts } => println!("gave up after {} attempts", attempts),
    /// }
    /// ```
    pub fn record_failure(&self, request: &mut QueuedRequest) -> RetryDecision {
        let failures = request.record_failure();

        if failures > self.max_retries {
            warn!(
                request_id = %request.id,
                endpoint = %request.endpoint,
                attempts = failures,
                max_retries = self.max_retries,
                "Retry attempts exhausted, abandoning request"
            );
            return RetryDecision::Abandon { attempts: failures };
        }

        info!(
            request_id = %request.id,
            attempt = failures,
            max_retries = self.max_retries,
            "Request failed, keeping for retry"
        );
        RetryDecision::Retry {
            attempt: failures,
            remaining: self.max_retries - failures,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::domain::MAX_RETRIES)
    }
}
