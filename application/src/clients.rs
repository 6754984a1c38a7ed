//! Client registry: model name → provider handle.
//!
//! Resolved once at configuration time. Every call goes through a timeout
//! and comes back as a [`CallOutcome`]; provider errors never escape.

use crate::ports::model_client::{ClientError, ModelClient};
use conclave_domain::{CallOutcome, Completion};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Routes each model to the client of the provider that serves it
#[derive(Clone)]
pub struct ClientRegistry {
    routes: HashMap<String, Arc<dyn ModelClient>>,
    timeout: Duration,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Serve `model` through `client`, replacing any earlier route
    pub fn register(&mut self, model: impl Into<String>, client: Arc<dyn ModelClient>) {
        self.routes.insert(model.into(), client);
    }

    pub fn contains(&self, model: &str) -> bool {
        self.routes.contains_key(model)
    }

    /// Routed model names, sorted
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.routes.keys().cloned().collect();
        models.sort();
        models
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn complete(&self, model: &str, prompt: &str) -> CallOutcome {
        let Some(client) = self.routes.get(model) else {
            return unrouted(model);
        };
        self.guarded(model, client.complete(prompt, model)).await
    }

    pub async fn critique(
        &self,
        model: &str,
        subject: &str,
        target_answer: &str,
        author: &str,
    ) -> CallOutcome {
        let Some(client) = self.routes.get(model) else {
            return unrouted(model);
        };
        self.guarded(model, client.critique(subject, target_answer, author, model))
            .await
    }

    pub async fn improve(
        &self,
        model: &str,
        subject: &str,
        previous_answer: &str,
        critiques: &[String],
    ) -> CallOutcome {
        let Some(client) = self.routes.get(model) else {
            return unrouted(model);
        };
        self.guarded(model, client.improve(subject, previous_answer, critiques, model))
            .await
    }

    async fn guarded<F>(&self, model: &str, call: F) -> CallOutcome
    where
        F: Future<Output = Result<Completion, ClientError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(completion)) => {
                debug!(model, chars = completion.content.len(), "Model call completed");
                CallOutcome::Success(completion)
            }
            Ok(Err(e)) => {
                warn!(model, error = %e, "Model call failed");
                CallOutcome::Failure(e.to_string())
            }
            Err(_) => {
                let e = ClientError::Timeout(self.timeout);
                warn!(model, error = %e, "Model call timed out");
                CallOutcome::Failure(e.to_string())
            }
        }
    }
}

fn unrouted(model: &str) -> CallOutcome {
    CallOutcome::Failure(ClientError::ModelNotAvailable(model.to_string()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ModelClient for Echo {
        fn provider(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ClientError> {
            Ok(Completion::new(format!("{model}: {prompt}")))
        }
    }

    struct Broken;

    #[async_trait]
    impl ModelClient for Broken {
        fn provider(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _prompt: &str, _model: &str) -> Result<Completion, ClientError> {
            Err(ClientError::ConnectionError("refused".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl ModelClient for Slow {
        fn provider(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _prompt: &str, _model: &str) -> Result<Completion, ClientError> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok(Completion::new("late"))
        }
    }

    #[tokio::test]
    async fn test_routes_to_registered_client() {
        let mut clients = ClientRegistry::new();
        clients.register("m1", Arc::new(Echo));
        let outcome = clients.complete("m1", "hi").await;
        assert_eq!(outcome.content(), Some("m1: hi"));
    }

    #[tokio::test]
    async fn test_unknown_model_is_a_failure() {
        let clients = ClientRegistry::new();
        let outcome = clients.complete("ghost", "hi").await;
        assert!(matches!(outcome, CallOutcome::Failure(ref r) if r.contains("ghost")));
    }

    #[tokio::test]
    async fn test_client_error_becomes_failure() {
        let mut clients = ClientRegistry::new();
        clients.register("m", Arc::new(Broken));
        let outcome = clients.critique("m", "q", "a", "other").await;
        assert!(matches!(outcome, CallOutcome::Failure(ref r) if r.contains("refused")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        let mut clients = ClientRegistry::new().with_timeout(Duration::from_secs(5));
        clients.register("m", Arc::new(Slow));
        let outcome = clients.complete("m", "hi").await;
        assert!(matches!(outcome, CallOutcome::Failure(ref r) if r.contains("Timed out")));
    }

    #[test]
    fn test_models_sorted() {
        let mut clients = ClientRegistry::new();
        clients.register("b", Arc::new(Echo));
        clients.register("a", Arc::new(Echo));
        assert_eq!(clients.models(), vec!["a", "b"]);
    }
}
