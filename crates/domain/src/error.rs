use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Connect failure: {0}")]
    ConnectFailure(String),

    #[error("Publish failure: {0}")]
    PublishFailure(String),

    #[error("State machine loop interrupted")]
    LoopInterrupted,
}

pub type Result<T> = std::result::Result<T, DomainError>;
