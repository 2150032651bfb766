// Queue Domain Model

/// Store key the whole queue is serialized under
pub const DEFAULT_STORAGE_KEY: &str = "offline_queue";

/// Capacity bound; overflow evicts from the oldest end
pub const MAX_QUEUE_SIZE: usize = 1000;

/// Failed attempts tolerated before an item is abandoned
pub const MAX_RETRIES: u32 = 3;

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub storage_key: String,
    pub max_queue_size: usize,
    pub max_retries: u32,
}

impl QueueConfig {
    pub fn new(storage_key: impl Into<String>, max_queue_size: usize, max_retries: u32) -> Self {
        Self {
            storage_key: storage_key.into(),
            max_queue_size,
            max_retries,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_KEY, MAX_QUEUE_SIZE, MAX_RETRIES)
    }
}
