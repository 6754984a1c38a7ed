//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("No models registered")]
    NoModels,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

impl DomainError {
    /// Check if this error is caused by a missing catalog entry
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, DomainError::UnknownModel(_) | DomainError::UnknownRole(_))
    }
}
