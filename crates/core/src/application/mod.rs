// Application Layer - Use Cases and Business Logic

pub mod maintenance;
pub mod processor;
pub mod queue;
pub mod retry;
pub mod worker;

// Re-exports
pub use maintenance::CleanupScheduler;
pub use processor::{PassOutcome, ProcessReport, QueueProcessor};
pub use queue::QueueEngine;
pub use retry::{RetryDecision, RetryPolicy};
pub use worker::{shutdown_channel, ProcessingWorker, ShutdownSender, ShutdownToken};
