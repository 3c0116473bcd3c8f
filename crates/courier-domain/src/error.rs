use thiserror::Error;
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("{0}")]
    ValidationError(String),
}
