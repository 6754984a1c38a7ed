//! Router parameters.

use conclave_domain::core::validation::{ConfigIssue, ConfigIssueCode, check_unit_interval};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quality gate, fallback and model-selection knobs for the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Minimum heuristic quality before a fallback is tried.
    pub min_quality: f64,
    /// Fallbacks tried after the primary model.
    pub max_fallback_attempts: usize,
    /// Models selected for an ensemble decision.
    pub ensemble_size: usize,
    /// Success rate a model needs in a domain to be promoted to primary.
    pub promotion_min_rate: f64,
    /// Outcomes a model needs in a domain before promotion is considered.
    pub promotion_min_samples: u64,
    /// Per-call timeout in seconds.
    pub call_timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_quality: 0.5,
            max_fallback_attempts: 2,
            ensemble_size: 3,
            promotion_min_rate: 0.6,
            promotion_min_samples: 2,
            call_timeout_secs: 60,
        }
    }
}

impl RouterConfig {
    // ==================== Builder Methods ====================

    pub fn with_min_quality(mut self, min_quality: f64) -> Self {
        self.min_quality = min_quality;
        self
    }

    pub fn with_max_fallback_attempts(mut self, attempts: usize) -> Self {
        self.max_fallback_attempts = attempts;
        self
    }

    pub fn with_ensemble_size(mut self, size: usize) -> Self {
        self.ensemble_size = size;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues: Vec<ConfigIssue> = [
            check_unit_interval("router.min_quality", self.min_quality),
            check_unit_interval("router.promotion_min_rate", self.promotion_min_rate),
        ]
        .into_iter()
        .flatten()
        .collect();

        if self.ensemble_size == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "router.ensemble_size".to_string(),
                },
                "router.ensemble_size must be at least 1",
            ));
        }
        if self.call_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "router.call_timeout_secs".to_string(),
                },
                "router.call_timeout_secs must be at least 1",
            ));
        }
        issues
    }
}
