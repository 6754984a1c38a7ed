//! Model client port
//!
//! Defines the interface for talking to one model provider.

use async_trait::async_trait;
use conclave_domain::{Completion, PromptTemplate};
use std::time::Duration;
use thiserror::Error;

/// Errors a provider can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Other error: {0}")]
    Other(String),
}

/// Client for one provider
///
/// Implementations (adapters) live in the infrastructure layer. `critique`
/// and `improve` default to plain completions over the shared templates.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider key this client serves
    fn provider(&self) -> &str;

    /// Send `prompt` to `model`
    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ClientError>;

    /// Have `model` critique `target_answer`, written by `author`
    async fn critique(
        &self,
        subject: &str,
        target_answer: &str,
        author: &str,
        model: &str,
    ) -> Result<Completion, ClientError> {
        let prompt = PromptTemplate::critique(subject, target_answer, author);
        self.complete(&prompt, model).await
    }

    /// Have `model` refine its `previous_answer` given `critiques`
    async fn improve(
        &self,
        subject: &str,
        previous_answer: &str,
        critiques: &[String],
        model: &str,
    ) -> Result<Completion, ClientError> {
        let prompt = PromptTemplate::improve(subject, previous_answer, critiques);
        self.complete(&prompt, model).await
    }
}
