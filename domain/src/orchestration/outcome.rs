use crate::consensus::ConsensusResult;
use crate::diffusion::DiffusionResult;
use crate::ensemble::EnsembleResult;
use crate::quality::ModelResponse;
use crate::routing::RoutingDecision;
use serde::{Deserialize, Serialize};

/// How the final answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStrategy {
    /// One model with quality-gated fallback
    Single,
    /// Several models reconciled by the consensus engine
    Consensus,
    /// Weighted vote over a performance-selected subset
    AdaptiveEnsemble,
}

impl AnswerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStrategy::Single => "single",
            AnswerStrategy::Consensus => "consensus",
            AnswerStrategy::AdaptiveEnsemble => "adaptive_ensemble",
        }
    }
}

impl std::fmt::Display for AnswerStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything an orchestrated request produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationOutcome {
    pub query: String,
    /// Prompt actually sent to the models (differs from `query` after diffusion)
    pub effective_prompt: String,
    pub answer: String,
    pub strategy: AnswerStrategy,
    pub decision: RoutingDecision,
    pub responses: Vec<ModelResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffusion: Option<DiffusionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<EnsembleResult>,
    pub latency_ms: u64,
}

impl OrchestrationOutcome {
    /// Models that returned a passing response
    pub fn successful_models(&self) -> Vec<&str> {
        self.responses
            .iter()
            .filter(|r| r.passed)
            .map(|r| r.model.as_str())
            .collect()
    }

    /// Overall confidence: consensus score when debated, otherwise the
    /// best passing response's confidence.
    pub fn confidence(&self) -> f64 {
        if let Some(consensus) = &self.consensus {
            return consensus.consensus_score;
        }
        self.responses
            .iter()
            .filter(|r| r.passed)
            .map(|r| r.confidence)
            .fold(0.0, f64::max)
    }
}
