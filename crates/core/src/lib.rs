// Offline Queue Core - Domain Logic & Ports
// NO infrastructure dependencies (storage, transport and connectivity are ports)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
