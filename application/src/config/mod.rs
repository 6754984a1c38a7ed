//! Application configuration.
//!
//! One plain struct per use case, each with defaults, builder methods and
//! `validate()`. [`OrchestrationConfig`] bundles them for wiring.
//!
//! | Type | Used by |
//! |------|---------|
//! | [`RouterConfig`] | `ModelRouter`, plan executor |
//! | [`ConsensusConfig`] | `ConsensusEngine` |
//! | [`EnsembleConfig`] | `AdaptiveEnsemble` |
//! | [`DiffusionConfig`] | `PromptDiffusion` |

mod consensus;
mod diffusion;
mod ensemble;
mod router;

pub use consensus::ConsensusConfig;
pub use diffusion::DiffusionConfig;
pub use ensemble::EnsembleConfig;
pub use router::RouterConfig;

use conclave_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// All use-case configuration in one place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub router: RouterConfig,
    pub consensus: ConsensusConfig,
    pub ensemble: EnsembleConfig,
    pub diffusion: DiffusionConfig,
}

impl OrchestrationConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.router.validate();
        issues.extend(self.consensus.validate());
        issues.extend(self.ensemble.validate());
        issues.extend(self.diffusion.validate());
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(OrchestrationConfig::default().validate().is_empty());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: OrchestrationConfig =
            serde_json::from_str(r#"{"consensus": {"max_rounds": 2}}"#).unwrap();
        assert_eq!(config.consensus.max_rounds, 2);
        assert_eq!(config.consensus.consensus_threshold, 0.80);
        assert_eq!(config.router, RouterConfig::default());
    }
}
