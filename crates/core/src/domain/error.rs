// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Endpoint must not be empty")]
    EmptyEndpoint,

    #[error("Unknown priority: {0}")]
    UnknownPriority(String),

    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
