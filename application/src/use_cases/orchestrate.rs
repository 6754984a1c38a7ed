//! Orchestration use case
//!
//! Single entry point for answering a query:
//!
//! 1. Optional prompt diffusion (a failure here only logs a warning)
//! 2. Routing decision
//! 3. One model behind a fallback chain, or an ensemble reconciled by the
//!    consensus engine or the adaptive ensemble
//! 4. Run-level outcome recorded in the performance tracker

use crate::config::OrchestrationConfig;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::RunEvent;
use crate::use_cases::adaptive_ensemble::{AdaptiveEnsemble, EnsembleError};
use crate::use_cases::build_consensus::{ConsensusEngine, ConsensusError};
use crate::use_cases::diffuse_prompt::PromptDiffusion;
use crate::use_cases::route_query::{ModelRouter, RouterError};
use conclave_domain::{
    AnswerStrategy, ConsensusResult, DiffusionResult, EnsembleResult, ModelResponse,
    OrchestrationOutcome, RoutingDecision, RoutingMode,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrateError {
    #[error("Routing failed: {0}")]
    Router(#[from] RouterError),

    #[error("Consensus failed: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Ensemble failed: {0}")]
    Ensemble(#[from] EnsembleError),
}

/// Input for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestrateInput {
    pub query: String,
    pub mode: RoutingMode,
    /// Rewrite the prompt before answering
    pub diffuse: bool,
    /// How an ensemble decision is reconciled
    pub ensemble_strategy: AnswerStrategy,
}

impl OrchestrateInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: RoutingMode::default(),
            diffuse: false,
            ensemble_strategy: AnswerStrategy::Consensus,
        }
    }

    pub fn with_mode(mut self, mode: RoutingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_diffusion(mut self) -> Self {
        self.diffuse = true;
        self
    }

    /// Reconcile ensembles by weighted vote instead of debate
    pub fn with_adaptive_ensemble(mut self) -> Self {
        self.ensemble_strategy = AnswerStrategy::AdaptiveEnsemble;
        self
    }
}

/// Why answering failed, and which models were called before it did
struct Unanswered {
    error: OrchestrateError,
    called: Vec<String>,
}

impl Unanswered {
    fn new(error: impl Into<OrchestrateError>, called: Vec<String>) -> Self {
        Self {
            error: error.into(),
            called,
        }
    }
}

impl From<RouterError> for Unanswered {
    fn from(error: RouterError) -> Self {
        let called = match &error {
            RouterError::AllModelsFailed { attempted } => attempted.clone(),
            RouterError::NoModels => Vec::new(),
        };
        Self::new(error, called)
    }
}

impl From<EnsembleError> for Unanswered {
    fn from(error: EnsembleError) -> Self {
        let called = match &error {
            EnsembleError::AllModelsFailed { attempted } => attempted.clone(),
            EnsembleError::NoCandidates | EnsembleError::TooFewModels { .. } => Vec::new(),
        };
        Self::new(error, called)
    }
}

/// What the answering stage produced
struct Answered {
    answer: String,
    strategy: AnswerStrategy,
    responses: Vec<ModelResponse>,
    consensus: Option<ConsensusResult>,
    ensemble: Option<EnsembleResult>,
}

pub struct Orchestrator {
    router: Arc<ModelRouter>,
    consensus: ConsensusEngine,
    ensemble: AdaptiveEnsemble,
    diffusion: PromptDiffusion,
}

impl Orchestrator {
    pub fn new(router: Arc<ModelRouter>, config: OrchestrationConfig) -> Self {
        Self {
            consensus: ConsensusEngine::new(Arc::clone(&router)).with_config(config.consensus),
            ensemble: AdaptiveEnsemble::new(Arc::clone(&router)).with_config(config.ensemble),
            diffusion: PromptDiffusion::new(Arc::clone(&router)).with_config(config.diffusion),
            router,
        }
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: OrchestrateInput,
    ) -> Result<OrchestrationOutcome, OrchestrateError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    pub async fn execute_with_progress(
        &self,
        input: OrchestrateInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<OrchestrationOutcome, OrchestrateError> {
        let start = Instant::now();

        let diffusion = if input.diffuse {
            self.diffuse(&input.query, progress).await
        } else {
            None
        };
        let effective_prompt = diffusion
            .as_ref()
            .map(|d| d.best.text.clone())
            .unwrap_or_else(|| input.query.clone());

        let decision = self.router.decide(&input.query, input.mode)?;

        let answered = self
            .answer(&effective_prompt, &decision, input.ensemble_strategy, progress)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let answered = match answered {
            Ok(answered) => answered,
            Err(Unanswered { error, called }) => {
                warn!("Orchestration failed: {}", error);
                self.router
                    .tracker()
                    .log_run(&called, false, latency_ms, decision.domain);
                return Err(error);
            }
        };

        let participants: Vec<String> = answered.responses.iter().map(|r| r.model.clone()).collect();
        self.router
            .tracker()
            .log_run(&participants, true, latency_ms, decision.domain);

        info!(
            "Answered with {} strategy in {} ms",
            answered.strategy, latency_ms
        );
        self.router.logger().log(RunEvent::new(
            "orchestration",
            json!({
                "strategy": answered.strategy.as_str(),
                "domain": decision.domain.as_str(),
                "models": participants,
                "diffused": diffusion.is_some(),
                "latency_ms": latency_ms,
            }),
        ));

        Ok(OrchestrationOutcome {
            query: input.query,
            effective_prompt,
            answer: answered.answer,
            strategy: answered.strategy,
            decision,
            responses: answered.responses,
            diffusion,
            consensus: answered.consensus,
            ensemble: answered.ensemble,
            latency_ms,
        })
    }

    async fn diffuse(&self, query: &str, progress: &dyn ProgressNotifier) -> Option<DiffusionResult> {
        match self.diffusion.diffuse_with_progress(query, progress).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Prompt diffusion skipped: {}", e);
                None
            }
        }
    }

    async fn answer(
        &self,
        prompt: &str,
        decision: &RoutingDecision,
        ensemble_strategy: AnswerStrategy,
        progress: &dyn ProgressNotifier,
    ) -> Result<Answered, Unanswered> {
        if !decision.use_ensemble {
            let result = self.router.execute_with_fallback(prompt, decision).await?;
            return Ok(Answered {
                answer: result.response.content.clone(),
                strategy: AnswerStrategy::Single,
                responses: result.attempts,
                consensus: None,
                ensemble: None,
            });
        }

        match ensemble_strategy {
            AnswerStrategy::AdaptiveEnsemble => {
                let run = self.ensemble.run_with_progress(prompt, progress).await?;
                Ok(Answered {
                    answer: run.result.final_answer.clone(),
                    strategy: AnswerStrategy::AdaptiveEnsemble,
                    responses: run.responses,
                    consensus: None,
                    ensemble: Some(run.result),
                })
            }
            AnswerStrategy::Single | AnswerStrategy::Consensus => {
                let responses = self
                    .router
                    .execute_ensemble_with_progress(prompt, decision, progress)
                    .await?;
                let consensus = match self
                    .consensus
                    .build_consensus_with_progress(prompt, &responses, progress)
                    .await
                {
                    Ok(consensus) => consensus,
                    Err(e) => {
                        let called = responses.iter().map(|r| r.model.clone()).collect();
                        return Err(Unanswered::new(e, called));
                    }
                };
                Ok(Answered {
                    answer: consensus.final_answer.clone(),
                    strategy: AnswerStrategy::Consensus,
                    responses,
                    consensus: Some(consensus),
                    ensemble: None,
                })
            }
        }
    }
}
