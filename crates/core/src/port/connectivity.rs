// Connectivity Oracle Port
use async_trait::async_trait;

/// Decides whether a processing pass may touch the network at all
///
/// Called once per pass. Implementations decide what "online" means
/// (platform reachability callback, TCP probe, metered-network policy).
#[async_trait]
pub trait ConnectivityOracle: Send + Sync {
    async fn should_attempt_network_operation(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Oracle with a fixed (but switchable) answer
    pub struct StaticConnectivity {
        online: AtomicBool,
        queries: AtomicUsize,
    }

    impl StaticConnectivity {
        pub fn new(online: bool) -> Self {
            Self {
                online: AtomicBool::new(online),
                queries: AtomicUsize::new(0),
            }
        }

        pub fn online() -> Self {
            Self::new(true)
        }

        pub fn offline() -> Self {
            Self::new(false)
        }

        pub fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }

        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectivityOracle for StaticConnectivity {
        async fn should_attempt_network_operation(&self) -> bool {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.online.load(Ordering::SeqCst)
        }
    }
}
