//! Adaptive ensemble value objects and weighting

use crate::performance::{ModelPerformance, NEUTRAL_PRIOR};
use serde::{Deserialize, Serialize};

/// Calls after which the history term stops discounting a model
const FULL_HISTORY_CALLS: f64 = 10.0;

/// Voting weight from a model's track record.
///
/// `success_rate * 0.4 + avg_quality * 0.4 + min(1, calls / 10) * 0.2`.
/// A model with no record gets neutral rates and no history credit.
pub fn model_weight(performance: Option<&ModelPerformance>) -> f64 {
    let (rate, quality, calls) = performance
        .map(|p| (p.success_rate(), p.avg_quality(), p.calls as f64))
        .unwrap_or((NEUTRAL_PRIOR, NEUTRAL_PRIOR, 0.0));
    rate * 0.4 + quality * 0.4 + (calls / FULL_HISTORY_CALLS).min(1.0) * 0.2
}

/// Score used to pick ensemble members: 60% performance, 40% capability
/// fit. Performance is the mean of success rate and average quality, or
/// 0.5 for a model never seen before.
pub fn selection_score(performance: Option<&ModelPerformance>, capability_score: f64) -> f64 {
    let perf = performance
        .map(|p| (p.success_rate() + p.avg_quality()) / 2.0)
        .unwrap_or(NEUTRAL_PRIOR);
    perf * 0.6 + capability_score * 0.4
}

/// One participating model's answer in an ensemble pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleVote {
    pub model: String,
    pub content: String,
    pub weight: f64,
    pub confidence: f64,
    pub quality_score: f64,
}

impl EnsembleVote {
    /// `weight * quality * confidence`
    pub fn score(&self) -> f64 {
        self.weight * self.quality_score * self.confidence
    }
}

/// Votes worth keeping: the top vote plus every vote scoring at least
/// `ratio` of it, best first.
pub fn leading_votes(votes: &[EnsembleVote], ratio: f64) -> Vec<&EnsembleVote> {
    let mut ranked: Vec<&EnsembleVote> = votes.iter().collect();
    ranked.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.model.cmp(&b.model))
    });
    let Some(top) = ranked.first().map(|v| v.score()) else {
        return Vec::new();
    };
    ranked.retain(|v| v.score() >= top * ratio);
    ranked
}

/// A member that failed mid-ensemble and the backup that would replace it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchingEvent {
    pub failed_model: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_model: Option<String>,
}

/// Outcome of an adaptive ensemble pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub final_answer: String,
    pub selected_models: Vec<String>,
    pub votes: Vec<EnsembleVote>,
    /// Models whose answers made it into the final answer
    pub contributors: Vec<String>,
    /// Whether several votes were merged by a synthesis call
    pub synthesized: bool,
    pub switching_events: Vec<SwitchingEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(successes: u64, failures: u64, quality: f64) -> ModelPerformance {
        let mut p = ModelPerformance::new("m");
        for _ in 0..successes {
            p.record_usage(0, 0.0, quality);
            p.mark_outcome(true, crate::routing::Domain::General);
        }
        for _ in 0..failures {
            p.record_usage(0, 0.0, quality);
            p.mark_outcome(false, crate::routing::Domain::General);
        }
        p
    }

    fn vote(model: &str, weight: f64, quality: f64, confidence: f64) -> EnsembleVote {
        EnsembleVote {
            model: model.to_string(),
            content: format!("answer from {model}"),
            weight,
            confidence,
            quality_score: quality,
        }
    }

    #[test]
    fn test_perfect_history_outweighs_failing_history() {
        let perfect = history(10, 0, 1.0);
        let failing = history(0, 10, 0.0);
        let strong = model_weight(Some(&perfect));
        let weak = model_weight(Some(&failing));
        assert!((strong - 1.0).abs() < 1e-9);
        assert!((weak - 0.2).abs() < 1e-9);
        assert!(strong >= weak);
    }

    #[test]
    fn test_unknown_model_weight() {
        assert!((model_weight(None) - 0.4).abs() < 1e-9);
        assert!((selection_score(None, 1.0) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_leading_votes_ratio() {
        let votes = vec![
            vote("a", 1.0, 0.8, 0.8),
            vote("b", 1.0, 0.75, 0.8),
            vote("c", 1.0, 0.3, 0.8),
        ];
        let leading = leading_votes(&votes, 0.8);
        let names: Vec<&str> = leading.iter().map(|v| v.model.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(leading_votes(&[], 0.8).is_empty());
    }
}
