// Port Layer - Interfaces for external collaborators

pub mod connectivity;
pub mod id_provider; // For deterministic testing
pub mod key_value_store;
pub mod request_executor;
pub mod time_provider;

// Re-exports
pub use connectivity::ConnectivityOracle;
pub use id_provider::IdProvider;
pub use key_value_store::KeyValueStore;
pub use request_executor::{ExecutionError, ExecutionResult, RequestExecutor};
pub use time_provider::TimeProvider;
