//! Prompt diffusion value objects
//!
//! Each round, every participating model rewrites the current prompt under
//! a [`RefinementRole`]. Rewrites become [`PromptVersion`]s linked to the
//! version they were derived from, so the full lineage of the winning
//! prompt can be replayed.

use crate::core::text;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Score given to the unmodified prompt
pub const BASELINE_SCORE: f64 = 0.5;

/// Angle a model takes when rewriting a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementRole {
    Clarifier,
    Expander,
    Critic,
    Specialist,
}

impl RefinementRole {
    pub const ALL: [RefinementRole; 4] = [
        RefinementRole::Clarifier,
        RefinementRole::Expander,
        RefinementRole::Critic,
        RefinementRole::Specialist,
    ];

    /// Role for participant `index` in 1-based `round`; rotates so each
    /// model tries a different angle every round.
    pub fn for_participant(index: usize, round: usize) -> Self {
        Self::ALL[(index + round.saturating_sub(1)) % Self::ALL.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefinementRole::Clarifier => "clarifier",
            RefinementRole::Expander => "expander",
            RefinementRole::Critic => "critic",
            RefinementRole::Specialist => "specialist",
        }
    }

    /// What the rewriting model is asked to do
    pub fn instruction(&self) -> &'static str {
        match self {
            RefinementRole::Clarifier => {
                "Remove ambiguity. Make the intent, scope and expected output format explicit."
            }
            RefinementRole::Expander => {
                "Add the context, constraints and details a strong answer would need."
            }
            RefinementRole::Critic => {
                "Find weaknesses such as loaded assumptions or missing criteria, and fix them."
            }
            RefinementRole::Specialist => {
                "Rewrite it with domain-specific terminology and the expectations of an expert."
            }
        }
    }
}

impl std::fmt::Display for RefinementRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One prompt in the lineage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    /// 0 for the original prompt, then increasing per rewrite
    pub version: usize,
    pub text: String,
    /// Model that wrote it, or `"user"` for the original
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub round: usize,
    pub score: f64,
    pub tags: Vec<String>,
}

impl PromptVersion {
    pub fn original(text: impl Into<String>) -> Self {
        Self {
            version: 0,
            text: text.into(),
            author: "user".to_string(),
            parent: None,
            round: 0,
            score: BASELINE_SCORE,
            tags: Vec::new(),
        }
    }

    pub fn rewrite(
        version: usize,
        parent: &PromptVersion,
        text: impl Into<String>,
        author: impl Into<String>,
        round: usize,
        role: RefinementRole,
    ) -> Self {
        let text = text.into();
        let tags = improvement_tags(&parent.text, &text, role);
        Self {
            version,
            text,
            author: author.into(),
            parent: Some(parent.version),
            round,
            score: 0.0,
            tags,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score.clamp(0.0, 1.0);
        self
    }
}

/// Length-ratio fallback when the judge gives no usable score
pub fn heuristic_rewrite_score(original: &str, rewrite: &str) -> f64 {
    let rewritten = text::word_count(rewrite);
    if rewritten == 0 {
        return 0.0;
    }
    let ratio = rewritten as f64 / text::word_count(original).max(1) as f64;
    match ratio {
        r if r > 3.0 => 0.4,
        r if r >= 1.1 => 0.7,
        r if r >= 0.8 => 0.55,
        _ => 0.3,
    }
}

/// How settled two consecutive versions are, in `0.0..=1.0`.
///
/// 50% word overlap, 30% length ratio, 20% score stability (a score jump
/// of 0.2 or more counts as fully unsettled).
pub fn convergence(previous: &PromptVersion, current: &PromptVersion) -> f64 {
    let a: BTreeSet<String> = text::words(&previous.text).into_iter().collect();
    let b: BTreeSet<String> = text::words(&current.text).into_iter().collect();
    let overlap = text::jaccard(&a, &b);

    let (la, lb) = (
        text::word_count(&previous.text) as f64,
        text::word_count(&current.text) as f64,
    );
    let length = if la.max(lb) == 0.0 { 1.0 } else { la.min(lb) / la.max(lb) };

    let stability = 1.0 - ((current.score - previous.score).abs() * 5.0).min(1.0);

    (0.5 * overlap + 0.3 * length + 0.2 * stability).clamp(0.0, 1.0)
}

fn improvement_tags(original: &str, rewrite: &str, role: RefinementRole) -> Vec<String> {
    let mut tags = vec![role.as_str().to_string()];
    let before = text::word_count(original).max(1) as f64;
    let ratio = text::word_count(rewrite) as f64 / before;
    if ratio >= 1.1 {
        tags.push("expanded".to_string());
    } else if ratio < 0.9 {
        tags.push("condensed".to_string());
    }
    if rewrite.contains('\n') && !original.contains('\n') {
        tags.push("structured".to_string());
    }
    tags
}

/// Outcome of a diffusion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusionResult {
    /// Best-scoring version from any round, the original included
    pub best: PromptVersion,
    /// Every version produced, in creation order; index 0 is the original
    pub versions: Vec<PromptVersion>,
    pub rounds_completed: usize,
    pub converged: bool,
    pub final_convergence: f64,
}

impl DiffusionResult {
    pub fn original(&self) -> &PromptVersion {
        &self.versions[0]
    }

    pub fn version(&self, id: usize) -> Option<&PromptVersion> {
        self.versions.iter().find(|v| v.version == id)
    }

    /// Chain from the original down to `id`
    pub fn lineage(&self, id: usize) -> Vec<&PromptVersion> {
        let mut chain = Vec::new();
        let mut cursor = self.version(id);
        while let Some(v) = cursor {
            chain.push(v);
            if chain.len() > self.versions.len() {
                break;
            }
            cursor = v.parent.and_then(|p| self.version(p));
        }
        chain.reverse();
        chain
    }

    pub fn improved(&self) -> bool {
        self.best.version != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_rotate_per_round() {
        assert_eq!(RefinementRole::for_participant(0, 1), RefinementRole::Clarifier);
        assert_eq!(RefinementRole::for_participant(1, 1), RefinementRole::Expander);
        assert_eq!(RefinementRole::for_participant(0, 2), RefinementRole::Expander);
        assert_eq!(RefinementRole::for_participant(3, 2), RefinementRole::Clarifier);
    }

    #[test]
    fn test_heuristic_score_bands() {
        let original = "explain rust lifetimes please";
        assert_eq!(heuristic_rewrite_score(original, ""), 0.0);
        assert_eq!(
            heuristic_rewrite_score(original, "explain rust lifetimes with examples for beginners"),
            0.7
        );
        assert_eq!(heuristic_rewrite_score(original, "explain rust lifetimes now"), 0.55);
        assert_eq!(heuristic_rewrite_score(original, "lifetimes"), 0.3);
        assert_eq!(heuristic_rewrite_score(original, &"word ".repeat(20)), 0.4);
    }

    #[test]
    fn test_convergence_identical_versions() {
        let a = PromptVersion::original("explain rust lifetimes");
        let mut b = a.clone();
        b.version = 1;
        assert!((convergence(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_convergence_drops_on_change() {
        let a = PromptVersion::original("explain rust lifetimes");
        let b = PromptVersion::rewrite(
            1,
            &a,
            "describe how the borrow checker reasons about references in detail",
            "m",
            1,
            RefinementRole::Expander,
        )
        .with_score(0.9);
        assert!(convergence(&a, &b) < 0.5);
        assert!(b.tags.contains(&"expanded".to_string()));
    }

    #[test]
    fn test_lineage() {
        let v0 = PromptVersion::original("p");
        let v1 = PromptVersion::rewrite(1, &v0, "p one", "a", 1, RefinementRole::Clarifier);
        let v2 = PromptVersion::rewrite(2, &v0, "p two", "b", 1, RefinementRole::Expander);
        let v3 = PromptVersion::rewrite(3, &v2, "p three", "a", 2, RefinementRole::Critic);
        let result = DiffusionResult {
            best: v3.clone(),
            versions: vec![v0, v1, v2, v3],
            rounds_completed: 2,
            converged: false,
            final_convergence: 0.4,
        };
        let ids: Vec<usize> = result.lineage(3).iter().map(|v| v.version).collect();
        assert_eq!(ids, vec![0, 2, 3]);
        assert!(result.improved());
    }
}
