//! Routing decision value object.

use super::domain::Domain;
use serde::{Deserialize, Serialize};

/// Caller preference between latency and answer quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// One model, cheapest adequate choice first
    Speed,
    /// Ensembles allowed for important or complex queries
    #[default]
    Accuracy,
}

impl RoutingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Speed => "speed",
            RoutingMode::Accuracy => "accuracy",
        }
    }
}

impl std::fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speed" | "fast" => Ok(RoutingMode::Speed),
            "accuracy" | "accurate" => Ok(RoutingMode::Accuracy),
            other => Err(format!("unknown routing mode: {other}")),
        }
    }
}

/// Which model(s) answer a query and in what order.
///
/// Created per request and consumed immediately; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// All models chosen for this request (primary first)
    pub selected_models: Vec<String>,
    /// Model tried first
    pub primary_model: String,
    /// Ordered alternates tried after a failed quality gate
    pub fallback_models: Vec<String>,
    /// Human-readable explanation of the choice
    pub rationale: String,
    /// Detected topic domain
    pub domain: Domain,
    /// Confidence in the choice (0.0-1.0)
    pub confidence: f64,
    /// Whether the selected models run as an ensemble
    pub use_ensemble: bool,
    /// Number of ensemble members (1 for single-model routing)
    pub ensemble_size: usize,
}

impl RoutingDecision {
    /// Single-model routing with an ordered fallback chain
    pub fn single(
        primary: impl Into<String>,
        fallbacks: Vec<String>,
        domain: Domain,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Self {
        let primary = primary.into();
        let mut selected = vec![primary.clone()];
        selected.extend(fallbacks.iter().cloned());
        Self {
            selected_models: selected,
            primary_model: primary,
            fallback_models: fallbacks,
            rationale: rationale.into(),
            domain,
            confidence: confidence.clamp(0.0, 1.0),
            use_ensemble: false,
            ensemble_size: 1,
        }
    }

    /// Ensemble routing over `members`; the first member is the primary.
    ///
    /// Returns `None` when `members` is empty.
    pub fn ensemble(
        members: Vec<String>,
        domain: Domain,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Option<Self> {
        let primary = members.first()?.clone();
        let size = members.len();
        Some(Self {
            fallback_models: members[1..].to_vec(),
            selected_models: members,
            primary_model: primary,
            rationale: rationale.into(),
            domain,
            confidence: confidence.clamp(0.0, 1.0),
            use_ensemble: true,
            ensemble_size: size,
        })
    }

    /// Primary followed by at most `max_fallback_attempts` fallbacks,
    /// without repeats.
    pub fn attempt_chain(&self, max_fallback_attempts: usize) -> Vec<&str> {
        let mut chain: Vec<&str> = vec![self.primary_model.as_str()];
        for fallback in &self.fallback_models {
            if chain.len() > max_fallback_attempts {
                break;
            }
            if !chain.contains(&fallback.as_str()) {
                chain.push(fallback.as_str());
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision() -> RoutingDecision {
        RoutingDecision::single(
            "a",
            vec!["b".to_string(), "c".to_string(), "d".to_string()],
            Domain::General,
            0.7,
            "test",
        )
    }

    #[test]
    fn test_attempt_chain_is_capped() {
        let d = decision();
        assert_eq!(d.attempt_chain(0), vec!["a"]);
        assert_eq!(d.attempt_chain(2), vec!["a", "b", "c"]);
        assert_eq!(d.attempt_chain(10), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_attempt_chain_skips_duplicates() {
        let d = RoutingDecision::single(
            "a",
            vec!["a".to_string(), "b".to_string()],
            Domain::General,
            0.5,
            "dup",
        );
        assert_eq!(d.attempt_chain(2), vec!["a", "b"]);
    }

    #[test]
    fn test_ensemble_decision() {
        let d = RoutingDecision::ensemble(
            vec!["x".to_string(), "y".to_string()],
            Domain::Coding,
            1.4,
            "important",
        )
        .unwrap();
        assert!(d.use_ensemble);
        assert_eq!(d.ensemble_size, 2);
        assert_eq!(d.primary_model, "x");
        assert_eq!(d.confidence, 1.0);
        assert!(RoutingDecision::ensemble(vec![], Domain::General, 0.5, "").is_none());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("speed".parse::<RoutingMode>().unwrap(), RoutingMode::Speed);
        assert_eq!("Accuracy".parse::<RoutingMode>().unwrap(), RoutingMode::Accuracy);
        assert!("slow".parse::<RoutingMode>().is_err());
        assert_eq!(RoutingMode::default(), RoutingMode::Accuracy);
    }
}
