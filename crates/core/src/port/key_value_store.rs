// Persistent Store Port (Interface)

use crate::error::Result;
use async_trait::async_trait;

/// Durable key-value storage the queue snapshot is written to
///
/// The engine keeps its whole state under a single key, so implementations
/// only need point reads and overwrites.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written or was deleted
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove a value (no-op for unknown keys)
    async fn delete(&self, key: &str) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store with switchable failure injection
    #[derive(Default)]
    pub struct InMemoryStore {
        values: Mutex<HashMap<String, Vec<u8>>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed raw bytes (e.g. a corrupted snapshot)
        pub fn with_value(self, key: &str, value: impl Into<Vec<u8>>) -> Self {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.into());
            self
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Number of successful `set` calls
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl KeyValueStore for InMemoryStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(AppError::Storage("mock read failure".to_string()));
            }
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Storage("mock write failure".to_string()));
            }
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Storage("mock write failure".to_string()));
            }
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }
}
