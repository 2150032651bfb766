//! JSON-RPC API Layer
//!
//! Exposes the offline queue engine and processor as JSON-RPC 2.0 methods
//! (`queue.*.v1`) on a localhost TCP port.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
