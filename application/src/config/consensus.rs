//! Consensus engine parameters.

use conclave_domain::core::validation::{ConfigIssue, ConfigIssueCode, check_unit_interval};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Upper bound on debate rounds.
    pub max_rounds: usize,
    /// Round consensus score that ends the debate early.
    pub consensus_threshold: f64,
    /// Minimum gain over the previous round to keep debating.
    pub min_improvement: f64,
    /// Answers less similar than this are in conflict.
    pub similarity_threshold: f64,
    /// Arguments averaging below this are regenerated between rounds.
    pub regenerate_below: f64,
    /// Run multi-round debate after the critique/refine pass.
    pub enable_debate: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            consensus_threshold: 0.80,
            min_improvement: 0.05,
            similarity_threshold: 0.6,
            regenerate_below: 0.7,
            enable_debate: true,
        }
    }
}

impl ConsensusConfig {
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_consensus_threshold(mut self, threshold: f64) -> Self {
        self.consensus_threshold = threshold;
        self
    }

    pub fn with_min_improvement(mut self, min_improvement: f64) -> Self {
        self.min_improvement = min_improvement;
        self
    }

    pub fn without_debate(mut self) -> Self {
        self.enable_debate = false;
        self
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues: Vec<ConfigIssue> = [
            check_unit_interval("consensus.consensus_threshold", self.consensus_threshold),
            check_unit_interval("consensus.min_improvement", self.min_improvement),
            check_unit_interval("consensus.similarity_threshold", self.similarity_threshold),
            check_unit_interval("consensus.regenerate_below", self.regenerate_below),
        ]
        .into_iter()
        .flatten()
        .collect();

        if self.enable_debate && self.max_rounds == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "consensus.max_rounds".to_string(),
                },
                "consensus.max_rounds is 0; debate is enabled but will never run",
            ));
        }
        issues
    }
}
