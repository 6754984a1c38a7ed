//! Model routing use case
//!
//! Classifies a query, picks the model(s) that answer it and runs them:
//! one model behind a quality-gated fallback chain, or an ensemble fanned
//! out concurrently. Provider errors and weak answers are treated alike;
//! only "nothing usable came back" is an error.

use crate::clients::ClientRegistry;
use crate::config::RouterConfig;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::{NoRunLogger, RunEvent, RunLogger};
use crate::tracker::PerformanceTracker;
use conclave_domain::performance::NEUTRAL_PRIOR;
use conclave_domain::{
    Capability, Domain, HeuristicQualityScorer, ModelPerformance, ModelProfile, ModelRegistry,
    ModelResponse, PerformanceSnapshot, Phase, QualityAssessment, QualityScorer, QueryTraits,
    RoutingDecision, RoutingMode,
};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during routing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("No models available")]
    NoModels,

    #[error("All models failed to respond: {}", attempted.join(", "))]
    AllModelsFailed { attempted: Vec<String> },
}

/// Result of a fallback run
#[derive(Debug, Clone)]
pub struct FallbackResult {
    /// Passing response, or the best degraded one when none passed
    pub response: ModelResponse,
    /// Every attempt in order, `response` included
    pub attempts: Vec<ModelResponse>,
}

impl FallbackResult {
    pub fn degraded(&self) -> bool {
        !self.response.passed
    }
}

/// Routes queries to models and executes them
pub struct ModelRouter {
    registry: Arc<ModelRegistry>,
    clients: Arc<ClientRegistry>,
    tracker: Arc<PerformanceTracker>,
    scorer: Arc<dyn QualityScorer>,
    config: RouterConfig,
    logger: Arc<dyn RunLogger>,
}

impl ModelRouter {
    pub fn new(
        registry: Arc<ModelRegistry>,
        clients: Arc<ClientRegistry>,
        tracker: Arc<PerformanceTracker>,
    ) -> Self {
        Self {
            registry,
            clients,
            tracker,
            scorer: Arc::new(HeuristicQualityScorer::new()),
            config: RouterConfig::default(),
            logger: Arc::new(NoRunLogger),
        }
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn QualityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn scorer(&self) -> &dyn QualityScorer {
        self.scorer.as_ref()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn logger(&self) -> &dyn RunLogger {
        self.logger.as_ref()
    }

    /// Profiles that have a client to serve them
    pub fn available_profiles(&self) -> Vec<&ModelProfile> {
        self.registry
            .profiles()
            .filter(|p| self.clients.contains(&p.name))
            .collect()
    }

    /// Decide which model(s) answer `query`
    pub fn decide(&self, query: &str, mode: RoutingMode) -> Result<RoutingDecision, RouterError> {
        let traits = QueryTraits::analyze(query);
        let available = self.available_profiles();
        if available.is_empty() {
            return Err(RouterError::NoModels);
        }

        let snapshot = self.available_snapshot(&available);
        let requested = traits.domain.preferred_capabilities();

        let mut ranked: Vec<(String, f64)> = available
            .iter()
            .map(|p| {
                let score = blended_score(p, snapshot.get(&p.name), traits.domain, &requested, mode);
                (p.name.clone(), score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut rationale = vec![format!("domain {}", traits.domain), format!("mode {mode}")];

        if let Some((best, rate)) =
            snapshot.best_for_domain(traits.domain, self.config.promotion_min_samples)
            && rate >= self.config.promotion_min_rate
            && let Some(pos) = ranked.iter().position(|(name, _)| name == best)
            && pos > 0
        {
            let promoted = ranked.remove(pos);
            debug!("Promoting {} for {} (success rate {:.2})", best, traits.domain, rate);
            rationale.push(format!("{best} promoted ({:.0}% success in domain)", rate * 100.0));
            ranked.insert(0, promoted);
        }

        let confidence = ranked.first().map(|(_, s)| *s).unwrap_or(NEUTRAL_PRIOR);
        let wants_ensemble = mode == RoutingMode::Accuracy && (traits.important || traits.complex);
        let size = self.config.ensemble_size.min(ranked.len());

        let names: Vec<String> = ranked.into_iter().map(|(name, _)| name).collect();
        let decision = if wants_ensemble && size >= 2 {
            if traits.important {
                rationale.push("important query".to_string());
            }
            if traits.complex {
                rationale.push("complex query".to_string());
            }
            RoutingDecision::ensemble(
                names[..size].to_vec(),
                traits.domain,
                confidence,
                rationale.join("; "),
            )
        } else {
            None
        };
        let decision = match decision {
            Some(d) => d,
            None => {
                let mut names = names.into_iter();
                let primary = names.next().ok_or(RouterError::NoModels)?;
                RoutingDecision::single(
                    primary,
                    names.collect(),
                    traits.domain,
                    confidence,
                    rationale.join("; "),
                )
            }
        };

        info!(
            "Routing to {} ({}, ensemble: {})",
            decision.primary_model, decision.domain, decision.use_ensemble
        );
        self.logger.log(RunEvent::new(
            "routing_decision",
            json!({
                "domain": decision.domain.as_str(),
                "mode": mode.as_str(),
                "primary": decision.primary_model,
                "selected": decision.selected_models,
                "ensemble": decision.use_ensemble,
                "confidence": decision.confidence,
            }),
        ));
        Ok(decision)
    }

    fn available_snapshot(&self, available: &[&ModelProfile]) -> PerformanceSnapshot {
        let models = self
            .tracker
            .snapshot()
            .into_inner()
            .into_iter()
            .filter(|(name, _)| available.iter().any(|p| &p.name == name))
            .collect();
        PerformanceSnapshot::new(models)
    }

    /// Call one model, score the answer and record it
    pub async fn call_model(&self, model: &str, prompt: &str, domain: Domain) -> ModelResponse {
        let start = Instant::now();
        let outcome = self.clients.complete(model, prompt).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let history = self.tracker.get(model);
        let assessment = match outcome.usable_content() {
            Some(content) => self.scorer.assess(content, history.as_ref()),
            None => QualityAssessment::ZERO,
        };
        let response = ModelResponse::from_outcome(
            model,
            outcome,
            assessment,
            self.config.min_quality,
            latency_ms,
        );
        self.tracker.record_response(&response, domain);

        self.logger.log(RunEvent::new(
            "model_response",
            json!({
                "model": response.model,
                "passed": response.passed,
                "quality": response.quality_score,
                "confidence": response.confidence,
                "latency_ms": response.latency_ms,
                "failure": response.failure_reason,
            }),
        ));
        response
    }

    /// Try the primary, then fallbacks, until one clears the quality gate.
    ///
    /// At most `1 + max_fallback_attempts` models are called. When none
    /// passes, the non-empty answer winning [`Self::vote_on_responses`] is
    /// returned as degraded.
    pub async fn execute_with_fallback(
        &self,
        prompt: &str,
        decision: &RoutingDecision,
    ) -> Result<FallbackResult, RouterError> {
        let chain = decision.attempt_chain(self.config.max_fallback_attempts);
        let mut attempts: Vec<ModelResponse> = Vec::with_capacity(chain.len());

        for (i, model) in chain.iter().enumerate() {
            let response = self.call_model(model, prompt, decision.domain).await;
            if response.passed {
                info!("Model {} passed the quality gate", model);
                attempts.push(response.clone());
                return Ok(FallbackResult { response, attempts });
            }

            let reason = response.failure_reason.clone().unwrap_or_default();
            warn!("Model {} failed: {}", model, reason);
            if let Some(next) = chain.get(i + 1) {
                self.logger.log(RunEvent::new(
                    "fallback",
                    json!({ "from": model, "to": next, "reason": reason }),
                ));
            }
            attempts.push(response);
        }

        let best = self
            .vote_on_responses(&attempts, decision.domain)
            .map(|(response, _)| response.clone());
        match best {
            Some(response) => {
                warn!(
                    "No model passed the quality gate; returning degraded answer from {}",
                    response.model
                );
                Ok(FallbackResult { response, attempts })
            }
            None => Err(RouterError::AllModelsFailed {
                attempted: chain.iter().map(|m| m.to_string()).collect(),
            }),
        }
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute_ensemble(
        &self,
        prompt: &str,
        decision: &RoutingDecision,
    ) -> Result<Vec<ModelResponse>, RouterError> {
        self.execute_ensemble_with_progress(prompt, decision, &NoProgress)
            .await
    }

    /// Run every selected model concurrently and keep what came back.
    ///
    /// Failed members are excluded, never retried. Passing answers are
    /// preferred; if none passed, any answer with content is kept.
    pub async fn execute_ensemble_with_progress(
        &self,
        prompt: &str,
        decision: &RoutingDecision,
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<ModelResponse>, RouterError> {
        let models = &decision.selected_models;
        info!("Querying {} models", models.len());
        progress.on_phase_start(Phase::Answering, models.len());

        let mut pending: FuturesUnordered<_> = models
            .iter()
            .map(|model| self.call_model(model, prompt, decision.domain))
            .collect();

        let mut responses = Vec::with_capacity(models.len());
        while let Some(response) = pending.next().await {
            progress.on_model_complete(Phase::Answering, &response.model, response.passed);
            if !response.passed {
                warn!(
                    "Model {} excluded: {}",
                    response.model,
                    response.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
            responses.push(response);
        }
        progress.on_phase_complete(Phase::Answering);

        // Keep selection order for deterministic downstream processing
        responses.sort_by_key(|r| models.iter().position(|m| m == &r.model));

        if responses.iter().any(|r| r.passed) {
            responses.retain(|r| r.passed);
        } else {
            responses.retain(|r| r.has_content());
        }
        if responses.is_empty() {
            return Err(RouterError::AllModelsFailed {
                attempted: models.clone(),
            });
        }
        Ok(responses)
    }

    /// Score each response by quality (40%), model reliability (30%),
    /// domain fit (20%) and confidence (10%); return the winner.
    pub fn vote_on_responses<'a>(
        &self,
        responses: &'a [ModelResponse],
        domain: Domain,
    ) -> Option<(&'a ModelResponse, f64)> {
        let snapshot = self.tracker.snapshot();
        let requested = domain.preferred_capabilities();
        responses
            .iter()
            .filter(|r| r.has_content())
            .map(|r| {
                let reliability = snapshot
                    .get(&r.model)
                    .map(ModelPerformance::success_rate)
                    .unwrap_or(NEUTRAL_PRIOR);
                let fit = self
                    .registry
                    .get(&r.model)
                    .map(|p| if p.has_affinity(domain) { 1.0 } else { p.coverage(&requested) })
                    .unwrap_or(0.0);
                let score =
                    r.quality_score * 0.4 + reliability * 0.3 + fit * 0.2 + r.confidence * 0.1;
                (r, score)
            })
            .fold(None, |best, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            })
    }
}

/// Capability, domain affinity, history and (in speed mode) efficiency
fn blended_score(
    profile: &ModelProfile,
    history: Option<&ModelPerformance>,
    domain: Domain,
    requested: &[Capability],
    mode: RoutingMode,
) -> f64 {
    let capability = profile.coverage(requested);
    let affinity = if profile.has_affinity(domain) { 1.0 } else { 0.0 };
    let performance = history
        .map(|h| (h.success_rate() + h.avg_quality()) / 2.0)
        .unwrap_or(NEUTRAL_PRIOR);
    match mode {
        RoutingMode::Accuracy => capability * 0.5 + affinity * 0.2 + performance * 0.3,
        RoutingMode::Speed => {
            capability * 0.4 + affinity * 0.2 + performance * 0.2 + profile.efficiency() * 0.2
        }
    }
}
