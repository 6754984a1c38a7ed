//! Scripted model client shared by use-case tests.

use crate::clients::ClientRegistry;
use crate::ports::model_client::{ClientError, ModelClient};
use crate::tracker::PerformanceTracker;
use crate::use_cases::route_query::ModelRouter;
use async_trait::async_trait;
use conclave_domain::{Completion, ModelProfile, ModelRegistry};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Canned answers per model, optionally keyed on a prompt substring
#[derive(Default)]
pub(crate) struct ScriptedClient {
    answers: Mutex<HashMap<String, String>>,
    rules: Mutex<Vec<(String, String, String)>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Default reply for `model`
    pub(crate) fn answer(self, model: &str, reply: &str) -> Self {
        self.answers
            .lock()
            .insert(model.to_string(), reply.to_string());
        self
    }

    /// Reply for `model` when the prompt contains `needle`; first match wins
    pub(crate) fn when(self, model: &str, needle: &str, reply: &str) -> Self {
        self.rules
            .lock()
            .push((model.to_string(), needle.to_string(), reply.to_string()));
        self
    }

    pub(crate) fn failing(self, model: &str) -> Self {
        self.failing.lock().insert(model.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, model: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == model).count()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ClientError> {
        self.calls
            .lock()
            .push((model.to_string(), prompt.to_string()));

        if self.failing.lock().contains(model) {
            return Err(ClientError::RequestFailed(format!("{model} is down")));
        }
        let rule = self
            .rules
            .lock()
            .iter()
            .find(|(m, needle, _)| m == model && prompt.contains(needle.as_str()))
            .map(|(_, _, reply)| reply.clone());
        if let Some(reply) = rule {
            return Ok(Completion::new(reply));
        }
        self.answers
            .lock()
            .get(model)
            .map(|reply| Completion::new(reply.clone()))
            .ok_or_else(|| ClientError::ModelNotAvailable(model.to_string()))
    }
}

/// Router over `models`, all served by `client`, with no history
pub(crate) fn router_for(client: Arc<ScriptedClient>, models: &[&str]) -> ModelRouter {
    router_with(
        client,
        models.iter().map(|m| ModelProfile::new(*m, "scripted")),
        Arc::new(PerformanceTracker::in_memory()),
    )
}

pub(crate) fn router_with(
    client: Arc<ScriptedClient>,
    profiles: impl IntoIterator<Item = ModelProfile>,
    tracker: Arc<PerformanceTracker>,
) -> ModelRouter {
    let registry = ModelRegistry::new(profiles);
    let mut clients = ClientRegistry::new();
    for name in registry.names() {
        clients.register(name, client.clone());
    }
    ModelRouter::new(Arc::new(registry), Arc::new(clients), tracker)
}

/// A sentence long enough to clear the default quality gate
pub(crate) fn solid(answer: &str) -> String {
    format!("{answer} This follows because the evidence is clear and consistent.")
}
