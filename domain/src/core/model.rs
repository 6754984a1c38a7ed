//! Model profile value objects
//!
//! A [`ModelProfile`] describes one remotely hosted model: who serves it,
//! what it is good at, and how expensive/slow it is relative to its peers.
//! Profiles are immutable once the registry has been built.

use crate::planning::StepRole;
use crate::routing::Domain;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

/// Load (cost + latency) of the cheapest, fastest rated profile on the 1-5 scale.
const REFERENCE_LOAD: f64 = 2.0;

/// Capability tag carried by a model profile (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Reasoning,
    Coding,
    Research,
    Analysis,
    Creative,
    Summarization,
    FactChecking,
    Math,
    LongContext,
    Fast,
    Custom(String),
}

impl Capability {
    /// Get the string identifier for this capability
    pub fn as_str(&self) -> &str {
        match self {
            Capability::Reasoning => "reasoning",
            Capability::Coding => "coding",
            Capability::Research => "research",
            Capability::Analysis => "analysis",
            Capability::Creative => "creative",
            Capability::Summarization => "summarization",
            Capability::FactChecking => "fact_checking",
            Capability::Math => "math",
            Capability::LongContext => "long_context",
            Capability::Fast => "fast",
            Capability::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "reasoning" => Capability::Reasoning,
            "coding" | "code" => Capability::Coding,
            "research" => Capability::Research,
            "analysis" => Capability::Analysis,
            "creative" => Capability::Creative,
            "summarization" => Capability::Summarization,
            "fact_checking" | "fact-checking" => Capability::FactChecking,
            "math" => Capability::Math,
            "long_context" | "long-context" => Capability::LongContext,
            "fast" => Capability::Fast,
            other => Capability::Custom(other.to_string()),
        })
    }
}

impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(capability) = s.parse::<Capability>();
        Ok(capability)
    }
}

/// Static description of one model endpoint.
///
/// Cost and latency ratings use a 1 (cheap/fast) to 5 (expensive/slow)
/// scale. A rating of 0 marks a no-cost stub profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Model identifier sent to the provider
    pub name: String,
    /// Key of the provider that serves this model
    pub provider: String,
    /// Capability tags
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    /// Relative cost rating
    #[serde(default)]
    pub cost_rating: f64,
    /// Relative latency rating
    #[serde(default)]
    pub latency_rating: f64,
    /// Maximum context window in tokens
    #[serde(default = "default_max_context")]
    pub max_context: u32,
    /// Plan step roles this model is preferred for
    #[serde(default)]
    pub preferred_roles: Vec<StepRole>,
    /// Topic domains this model is known to handle well
    #[serde(default)]
    pub domain_affinity: Vec<Domain>,
}

fn default_max_context() -> u32 {
    8_192
}

impl ModelProfile {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            capabilities: BTreeSet::new(),
            cost_rating: 0.0,
            latency_rating: 0.0,
            max_context: default_max_context(),
            preferred_roles: Vec::new(),
            domain_affinity: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_ratings(mut self, cost: f64, latency: f64) -> Self {
        self.cost_rating = cost;
        self.latency_rating = latency;
        self
    }

    pub fn with_max_context(mut self, max_context: u32) -> Self {
        self.max_context = max_context;
        self
    }

    pub fn with_preferred_roles(mut self, roles: impl IntoIterator<Item = StepRole>) -> Self {
        self.preferred_roles.extend(roles);
        self
    }

    pub fn with_domain_affinity(mut self, domains: impl IntoIterator<Item = Domain>) -> Self {
        self.domain_affinity.extend(domains);
        self
    }

    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn prefers_role(&self, role: StepRole) -> bool {
        self.preferred_roles.contains(&role)
    }

    pub fn has_affinity(&self, domain: Domain) -> bool {
        self.domain_affinity.contains(&domain)
    }

    /// Efficiency in `0.0..=1.0`, the inverse of cost + latency.
    ///
    /// A profile with both ratings at zero is maximally efficient.
    pub fn efficiency(&self) -> f64 {
        let load = self.cost_rating.max(0.0) + self.latency_rating.max(0.0);
        if load <= f64::EPSILON {
            return 1.0;
        }
        (REFERENCE_LOAD / load).min(1.0)
    }

    /// Fraction of `requested` capabilities this profile covers, weighted by
    /// [`efficiency`](Self::efficiency).
    ///
    /// An empty request counts as full coverage.
    pub fn score_for_capabilities(&self, requested: &[Capability]) -> f64 {
        self.coverage(requested) * self.efficiency()
    }

    /// Capability coverage without the efficiency weighting.
    pub fn coverage(&self, requested: &[Capability]) -> f64 {
        if requested.is_empty() {
            return 1.0;
        }
        let matched = requested
            .iter()
            .filter(|c| self.capabilities.contains(c))
            .count();
        matched as f64 / requested.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ModelProfile {
        ModelProfile::new("test-model", "local")
            .with_capabilities([Capability::Reasoning, Capability::Coding])
            .with_ratings(2.0, 2.0)
    }

    #[test]
    fn test_capability_roundtrip() {
        for cap in [Capability::Reasoning, Capability::FactChecking, Capability::LongContext] {
            let parsed: Capability = cap.to_string().parse().unwrap();
            assert_eq!(parsed, cap);
        }
    }

    #[test]
    fn test_custom_capability() {
        let cap: Capability = "vision".parse().unwrap();
        assert_eq!(cap, Capability::Custom("vision".to_string()));
        assert_eq!(cap.to_string(), "vision");
    }

    #[test]
    fn test_score_full_coverage() {
        let p = profile();
        let score = p.score_for_capabilities(&[Capability::Reasoning, Capability::Coding]);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_partial_coverage() {
        let p = profile();
        let score = p.score_for_capabilities(&[Capability::Reasoning, Capability::Math]);
        assert!((score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_score_zero_ratings_is_maximally_efficient() {
        let p = ModelProfile::new("stub", "none").with_capabilities([Capability::Reasoning]);
        assert_eq!(p.efficiency(), 1.0);
        assert_eq!(p.score_for_capabilities(&[Capability::Reasoning]), 1.0);
        assert!(p.score_for_capabilities(&[Capability::Math]).is_finite());
    }

    #[test]
    fn test_score_empty_request() {
        let p = ModelProfile::new("stub", "none");
        assert_eq!(p.score_for_capabilities(&[]), 1.0);
    }

    #[test]
    fn test_profile_deserialize_defaults() {
        let json = r#"{"name": "m", "provider": "p", "capabilities": ["coding", "vision"]}"#;
        let p: ModelProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.max_context, 8_192);
        assert!(p.has_capability(&Capability::Coding));
        assert!(p.has_capability(&Capability::Custom("vision".to_string())));
        assert!(p.preferred_roles.is_empty());
    }
}
