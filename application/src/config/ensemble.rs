//! Adaptive ensemble parameters.

use conclave_domain::core::validation::{ConfigIssue, ConfigIssueCode, check_unit_interval};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub min_models: usize,
    pub max_models: usize,
    /// Votes scoring at least this share of the top vote are synthesized
    /// together with it.
    pub synthesis_ratio: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            min_models: 2,
            max_models: 5,
            synthesis_ratio: 0.8,
        }
    }
}

impl EnsembleConfig {
    pub fn with_bounds(mut self, min_models: usize, max_models: usize) -> Self {
        self.min_models = min_models;
        self.max_models = max_models;
        self
    }

    pub fn with_synthesis_ratio(mut self, ratio: f64) -> Self {
        self.synthesis_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues: Vec<ConfigIssue> =
            check_unit_interval("ensemble.synthesis_ratio", self.synthesis_ratio)
                .into_iter()
                .collect();

        if self.min_models > self.max_models {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvertedBounds {
                    field: "ensemble.min_models".to_string(),
                },
                format!(
                    "ensemble.min_models ({}) exceeds ensemble.max_models ({})",
                    self.min_models, self.max_models
                ),
            ));
        }
        if self.max_models == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "ensemble.max_models".to_string(),
                },
                "ensemble.max_models must be at least 1",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_bounds() {
        let issues = EnsembleConfig::default().with_bounds(4, 2).validate();
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::InvertedBounds { .. }
        ));
    }
}
