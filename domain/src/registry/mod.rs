//! Model registry: the static catalog of model profiles.
//!
//! Built once at startup (from configuration or [`ModelRegistry::builtin`])
//! and shared read-only afterwards. Selection helpers rank profiles by
//! capability coverage; performance history is layered on top by the
//! router and ensemble, not here.

use crate::core::error::DomainError;
use crate::core::model::{Capability, ModelProfile};
use crate::hierarchy::ModelTier;
use crate::planning::StepRole;
use crate::routing::Domain;
use std::collections::BTreeMap;

/// Immutable catalog of model profiles keyed by model name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    profiles: BTreeMap<String, ModelProfile>,
}

impl ModelRegistry {
    /// Build a registry; later profiles with a duplicate name replace earlier ones.
    pub fn new(profiles: impl IntoIterator<Item = ModelProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// Catalog used when configuration defines no models
    pub fn builtin() -> Self {
        use Capability::*;
        Self::new([
            ModelProfile::new("gpt-4o", "openai")
                .with_capabilities([Reasoning, Coding, Analysis, Creative, Summarization])
                .with_ratings(4.0, 3.0)
                .with_max_context(128_000)
                .with_preferred_roles([StepRole::Draft, StepRole::Synthesize])
                .with_domain_affinity([Domain::Coding, Domain::Business]),
            ModelProfile::new("gpt-4o-mini", "openai")
                .with_capabilities([Fast, Summarization, Coding])
                .with_ratings(1.0, 1.0)
                .with_max_context(128_000)
                .with_preferred_roles([StepRole::Retrieval, StepRole::Draft]),
            ModelProfile::new("claude-3-5-sonnet", "anthropic")
                .with_capabilities([Reasoning, Coding, Analysis, Research, LongContext])
                .with_ratings(4.0, 3.0)
                .with_max_context(200_000)
                .with_preferred_roles([StepRole::Critique, StepRole::Synthesize])
                .with_domain_affinity([Domain::Coding, Domain::Legal]),
            ModelProfile::new("claude-3-5-haiku", "anthropic")
                .with_capabilities([Fast, Summarization, FactChecking])
                .with_ratings(1.0, 1.0)
                .with_max_context(200_000)
                .with_preferred_roles([StepRole::FactCheck, StepRole::Retrieval]),
            ModelProfile::new("gemini-1.5-pro", "google")
                .with_capabilities([Reasoning, Research, Math, LongContext, FactChecking])
                .with_ratings(3.0, 3.0)
                .with_max_context(1_000_000)
                .with_preferred_roles([StepRole::Research, StepRole::FactCheck])
                .with_domain_affinity([Domain::Science, Domain::Math, Domain::Medical]),
            ModelProfile::new("llama-3.1-70b", "ollama")
                .with_capabilities([Reasoning, Creative, Coding])
                .with_ratings(0.0, 4.0)
                .with_max_context(128_000)
                .with_preferred_roles([StepRole::Draft])
                .with_domain_affinity([Domain::Creative]),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&ModelProfile> {
        self.profiles.get(name)
    }

    /// Profile lookup that reports unknown names as a domain error
    pub fn require(&self, name: &str) -> Result<&ModelProfile, DomainError> {
        self.get(name)
            .ok_or_else(|| DomainError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &ModelProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Keep only the models accepted by `keep` (used to drop models whose
    /// provider is unavailable at configuration time).
    pub fn retain(mut self, mut keep: impl FnMut(&ModelProfile) -> bool) -> Self {
        self.profiles.retain(|_, p| keep(p));
        self
    }

    /// All profiles ranked by [`ModelProfile::score_for_capabilities`],
    /// best first. Ties resolve by name.
    pub fn rank_for_capabilities(&self, requested: &[Capability]) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .profiles
            .values()
            .map(|p| (p.name.clone(), p.score_for_capabilities(requested)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Ordered candidate list for one plan step.
    ///
    /// Coverage first, then a bonus for profiles preferring `role`, then a
    /// tier bias: premium tiers ignore cost, economy tiers favour cheap models.
    pub fn candidates_for_step(
        &self,
        requested: &[Capability],
        role: StepRole,
        tier: ModelTier,
        limit: usize,
    ) -> Vec<String> {
        let mut scored: Vec<(String, f64)> = self
            .profiles
            .values()
            .map(|p| {
                let coverage = p.coverage(requested);
                let role_bonus = if p.prefers_role(role) { 0.2 } else { 0.0 };
                let tier_term = match tier {
                    ModelTier::Premium => 0.0,
                    ModelTier::Standard => 0.1 * p.efficiency(),
                    ModelTier::Economy => 0.4 * p.efficiency(),
                };
                (p.name.clone(), coverage + role_bonus + tier_term)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.into_iter().take(limit).map(|(name, _)| name).collect()
    }

    /// Models whose profile lists `domain` as an affinity
    pub fn with_affinity(&self, domain: Domain) -> Vec<&ModelProfile> {
        self.profiles
            .values()
            .filter(|p| p.has_affinity(domain))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_populated() {
        let registry = ModelRegistry::builtin();
        assert!(registry.len() >= 4);
        assert!(registry.contains("gpt-4o"));
        assert!(registry.require("missing").is_err());
    }

    #[test]
    fn test_rank_prefers_coverage() {
        let registry = ModelRegistry::new([
            ModelProfile::new("math", "p")
                .with_capabilities([Capability::Math])
                .with_ratings(1.0, 1.0),
            ModelProfile::new("poet", "p")
                .with_capabilities([Capability::Creative])
                .with_ratings(1.0, 1.0),
        ]);
        let ranked = registry.rank_for_capabilities(&[Capability::Math]);
        assert_eq!(ranked[0].0, "math");
        assert_eq!(ranked[1].1, 0.0);
    }

    #[test]
    fn test_rank_never_fails_on_zero_ratings() {
        let registry = ModelRegistry::new([ModelProfile::new("stub", "none")]);
        let ranked = registry.rank_for_capabilities(&[Capability::Reasoning]);
        assert_eq!(ranked, vec![("stub".to_string(), 0.0)]);
    }

    #[test]
    fn test_candidates_for_step_tier_bias() {
        let registry = ModelRegistry::new([
            ModelProfile::new("big", "p")
                .with_capabilities([Capability::Reasoning])
                .with_ratings(5.0, 5.0),
            ModelProfile::new("small", "p")
                .with_capabilities([Capability::Reasoning])
                .with_ratings(1.0, 1.0),
        ]);
        let economy = registry.candidates_for_step(
            &[Capability::Reasoning],
            StepRole::Draft,
            ModelTier::Economy,
            2,
        );
        assert_eq!(economy[0], "small");

        let premium = registry.candidates_for_step(
            &[Capability::Reasoning],
            StepRole::Draft,
            ModelTier::Premium,
            1,
        );
        // Equal coverage with no cost bias resolves by name
        assert_eq!(premium, vec!["big".to_string()]);
    }

    #[test]
    fn test_retain_drops_models() {
        let registry = ModelRegistry::builtin().retain(|p| p.provider != "ollama");
        assert!(!registry.contains("llama-3.1-70b"));
        assert!(registry.contains("gpt-4o"));
    }
}
