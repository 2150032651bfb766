// Offline Queue Infrastructure - Network Adapters
// Implements: RequestExecutor, ConnectivityOracle

pub mod connectivity;
pub mod http_executor;

pub use connectivity::{ConnectivitySwitch, TcpConnectivityProbe};
pub use http_executor::{HttpExecutorConfig, HttpRequestExecutor};
