//! Prompt diffusion parameters.

use conclave_domain::core::validation::{ConfigIssue, check_unit_interval};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionConfig {
    pub max_rounds: usize,
    /// Convergence between consecutive best versions that stops the loop.
    pub convergence_threshold: f64,
    /// Models that take part in rewriting.
    pub participants: usize,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            convergence_threshold: 0.85,
            participants: 3,
        }
    }
}

impl DiffusionConfig {
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        check_unit_interval("diffusion.convergence_threshold", self.convergence_threshold)
            .into_iter()
            .collect()
    }
}
