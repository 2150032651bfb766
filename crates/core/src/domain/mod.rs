// Domain Layer - Pure data model, ordering and invariants

pub mod error;
pub mod ordering;
pub mod queue;
pub mod request;
pub mod stats;

// Re-exports
pub use error::DomainError;
pub use ordering::{schedule_key, sort_for_schedule};
pub use queue::{QueueConfig, DEFAULT_STORAGE_KEY, MAX_QUEUE_SIZE, MAX_RETRIES};
pub use request::{EnqueueSpec, HttpMethod, Priority, QueuedRequest, RequestId, RequestPayload};
pub use stats::QueueStats;
