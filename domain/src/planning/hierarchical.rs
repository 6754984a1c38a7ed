//! Role-hierarchy planner
//!
//! Classifies prompt complexity, splits moderate and complex prompts into
//! sub-tasks and hands each sub-task to a specialist role. Complex prompts
//! also get an assistant tier beneath the specialists and a quality review
//! before the executive synthesizes.

use super::plan::{PlanError, ReasoningPlan};
use super::step::{PlanStep, StepRole};
use super::Planner;
use crate::hierarchy::{self, RoleHierarchy};
use crate::registry::ModelRegistry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MIN_SUBTASKS: usize = 2;
const MAX_SUBTASKS: usize = 4;
const CANDIDATES_PER_STEP: usize = 3;

const CONJUNCTIONS: &[&str] = &[
    "and", "or", "but", "also", "while", "whereas", "then", "plus", "versus", "vs",
];
const ENUMERATION_WORDS: &[&str] = &[
    "first", "second", "third", "finally", "additionally", "furthermore", "lastly", "next",
];
const RESEARCH_CUES: &[&str] = &[
    "what", "who", "when", "where", "history", "find", "list", "background", "research",
    "gather", "origin", "sources",
];
const VERIFY_CUES: &[&str] = &[
    "verify", "check", "confirm", "accurate", "true", "validate", "correct",
];

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:\d+[.)]|[-*•])\s+(.+)$").expect("list item pattern is valid")
});

static COMPARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcompare\s+(.+?)\s+(?:and|with|to|versus|vs\.?)\s+([^,.?;!\n]+)")
        .expect("compare pattern is valid")
});

/// Coarse prompt complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Score conjunction density, enumeration cues, length and question
    /// count.
    pub fn classify(prompt: &str) -> Self {
        let lowered = prompt.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Complexity::Simple;
        }

        let mut score = 0;

        score += match words.len() {
            n if n > 80 => 2,
            n if n > 30 => 1,
            _ => 0,
        };

        let conjunctions = words.iter().filter(|w| CONJUNCTIONS.contains(w)).count();
        let density = conjunctions as f64 / words.len() as f64;
        score += if conjunctions >= 3 || density > 0.06 {
            2
        } else if conjunctions >= 1 {
            1
        } else {
            0
        };

        let enumerations = LIST_ITEM.find_iter(prompt).count()
            + words.iter().filter(|w| ENUMERATION_WORDS.contains(w)).count();
        score += match enumerations {
            0 => 0,
            1 => 1,
            _ => 2,
        };

        if prompt.matches('?').count() > 1 {
            score += 1;
        }

        match score {
            0..=1 => Complexity::Simple,
            2..=3 => Complexity::Moderate,
            _ => Complexity::Complex,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }

    fn confidence(&self) -> f64 {
        match self {
            Complexity::Simple => 0.85,
            Complexity::Moderate => 0.75,
            Complexity::Complex => 0.65,
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Split a prompt into 2-4 sub-task descriptions.
///
/// Tries, in order: explicit list items, a "compare X and Y" cue, sentence
/// and question boundaries, a split at the first "and". Falls back to a
/// research/analysis pair over the whole prompt. Extra pieces are folded
/// into the last sub-task.
pub fn split_subtasks(prompt: &str) -> Vec<String> {
    let prompt = prompt.trim();

    let mut parts: Vec<String> = LIST_ITEM
        .captures_iter(prompt)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect();

    if parts.len() < MIN_SUBTASKS
        && let Some(caps) = COMPARE.captures(prompt)
    {
        let left = caps[1].trim();
        let right = caps[2].trim();
        parts = vec![
            format!("Analyze {left}"),
            format!("Analyze {right}"),
            format!("Compare {left} and {right}"),
        ];
    }

    if parts.len() < MIN_SUBTASKS {
        parts = prompt
            .split_inclusive(['.', '?', '!', ';', '\n'])
            .map(|s| s.trim().to_string())
            .filter(|s| s.split_whitespace().count() >= 3)
            .collect();
    }

    if parts.len() < MIN_SUBTASKS
        && let Some((left, right)) = prompt.split_once(" and ")
        && left.split_whitespace().count() >= 2
        && right.split_whitespace().count() >= 2
    {
        parts = vec![left.trim().to_string(), right.trim().to_string()];
    }

    if parts.len() < MIN_SUBTASKS {
        parts = vec![
            format!("Research background for: {prompt}"),
            format!("Analyze: {prompt}"),
        ];
    }

    if parts.len() > MAX_SUBTASKS {
        let rest = parts.split_off(MAX_SUBTASKS - 1);
        parts.push(rest.join(" "));
    }
    parts
}

/// Specialist role best suited to a sub-task description
pub fn assign_role(subtask: &str) -> &'static str {
    let lowered = subtask.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let hits = |cues: &[&str]| words.iter().filter(|w| cues.contains(w)).count();

    if hits(VERIFY_CUES) > 0 {
        hierarchy::FACT_CHECKER
    } else if hits(RESEARCH_CUES) > 0 {
        hierarchy::LEAD_RESEARCHER
    } else {
        hierarchy::LEAD_ANALYST
    }
}

/// Plans by delegating sub-tasks down the role hierarchy
#[derive(Debug, Clone)]
pub struct HierarchicalPlanner {
    hierarchy: RoleHierarchy,
}

impl HierarchicalPlanner {
    pub fn new(hierarchy: RoleHierarchy) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Build a step owned by `role_name`, with candidates for its tier
    fn role_step(
        &self,
        registry: &ModelRegistry,
        id: String,
        role_name: &str,
        description: String,
    ) -> PlanStep {
        let (step_role, capabilities) = match self.hierarchy.get(role_name) {
            Some(role) if !role.required_capabilities.is_empty() => {
                (role.default_step, role.required_capabilities.clone())
            }
            Some(role) => (role.default_step, role.default_step.default_capabilities()),
            None => (StepRole::Draft, StepRole::Draft.default_capabilities()),
        };
        let candidates = registry.candidates_for_step(
            &capabilities,
            step_role,
            self.hierarchy.model_tier(role_name),
            CANDIDATES_PER_STEP,
        );
        PlanStep::new(id, step_role, description)
            .with_capabilities(capabilities)
            .with_candidates(candidates)
            .with_assigned_role(role_name)
    }

    /// Assistant that supports `specialist`: its own first child, otherwise
    /// the research assistant.
    fn assistant_for(&self, specialist: &str) -> &str {
        self.hierarchy
            .get(specialist)
            .and_then(|r| r.children.first())
            .map(String::as_str)
            .unwrap_or(hierarchy::RESEARCH_ASSISTANT)
    }

    fn simple_plan(&self, prompt: &str, registry: &ModelRegistry) -> Vec<PlanStep> {
        let specialist = assign_role(prompt);
        vec![
            self.role_step(registry, "answer".to_string(), specialist, prompt.to_string()),
            self.role_step(
                registry,
                "synthesize".to_string(),
                hierarchy::EXECUTIVE,
                "Review the answer and produce the final response".to_string(),
            )
            .with_dependencies(["answer"])
            .sequential(),
        ]
    }

    fn delegated_plan(
        &self,
        prompt: &str,
        complexity: Complexity,
        registry: &ModelRegistry,
    ) -> Vec<PlanStep> {
        let subtasks: Vec<(String, &'static str)> = split_subtasks(prompt)
            .into_iter()
            .map(|s| {
                let role = assign_role(&s);
                (s, role)
            })
            .collect();

        // Higher-authority owners first; all specialists share a level so
        // their relative order is kept.
        let role_names: Vec<&str> = subtasks.iter().map(|(_, r)| *r).collect();
        let scheduled = self.hierarchy.execution_order(&role_names);

        let mut remaining = subtasks;
        let mut ordered = Vec::with_capacity(remaining.len());
        for role in &scheduled {
            if let Some(pos) = remaining.iter().position(|(_, r)| r == role) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.extend(remaining);

        let mut steps = Vec::new();
        let mut subtask_ids = Vec::new();

        for (i, (description, specialist)) in ordered.into_iter().enumerate() {
            let id = format!("subtask_{}", i + 1);
            let mut step = self.role_step(registry, id.clone(), specialist, description.clone());

            if complexity == Complexity::Complex {
                let assistant = self.assistant_for(specialist);
                let support_id = format!("{id}_support");
                steps.push(self.role_step(
                    registry,
                    support_id.clone(),
                    assistant,
                    format!("Gather supporting material for: {description}"),
                ));
                step = step.with_dependencies([support_id]);
            }

            steps.push(step);
            subtask_ids.push(id);
        }

        let (review_id, reviewer) = match complexity {
            Complexity::Complex => ("quality_review", hierarchy::QUALITY_MANAGER),
            _ => ("cross_review", hierarchy::CRITIC),
        };
        steps.push(
            self.role_step(
                registry,
                review_id.to_string(),
                reviewer,
                "Review the sub-task outputs for gaps, errors and contradictions".to_string(),
            )
            .with_dependencies(subtask_ids.iter().cloned()),
        );

        steps.push(
            self.role_step(
                registry,
                "synthesize".to_string(),
                hierarchy::EXECUTIVE,
                "Combine the reviewed sub-task outputs into the final answer".to_string(),
            )
            .with_dependencies(subtask_ids.into_iter().chain([review_id.to_string()]))
            .sequential(),
        );

        steps
    }
}

impl Default for HierarchicalPlanner {
    fn default() -> Self {
        Self::new(RoleHierarchy::standard())
    }
}

impl Planner for HierarchicalPlanner {
    fn name(&self) -> &'static str {
        "hierarchical"
    }

    fn plan(&self, prompt: &str, registry: &ModelRegistry) -> Result<ReasoningPlan, PlanError> {
        if prompt.trim().is_empty() {
            return Err(PlanError::EmptyPrompt);
        }

        let complexity = Complexity::classify(prompt);
        let steps = match complexity {
            Complexity::Simple => self.simple_plan(prompt, registry),
            Complexity::Moderate | Complexity::Complex => {
                self.delegated_plan(prompt, complexity, registry)
            }
        };

        let mut focus: Vec<String> = Vec::new();
        for role in steps.iter().filter_map(|s| s.assigned_role.as_ref()) {
            if !focus.contains(role) {
                focus.push(role.clone());
            }
        }
        let subtasks = steps
            .iter()
            .filter(|s| s.id.starts_with("subtask_") && !s.id.ends_with("_support"))
            .count();

        Ok(
            ReasoningPlan::new(steps, format!("hierarchical/{complexity}"))?
                .with_confidence(complexity.confidence())
                .with_focus(focus)
                .with_context_summary(format!(
                    "{complexity} prompt delegated as {subtasks} sub-task(s)"
                )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const COMPLEX_PROMPT: &str = "Help me plan a product launch.\n\
        1. Research the history of similar launches and what went wrong\n\
        2. Analyze our pricing against two competitors and the market\n\
        3. Verify that the revenue projections are accurate\n\
        4. Draft a timeline and also a risk register\n\
        5. Finally propose marketing channels, but keep costs low";

    fn assert_valid_order(plan: &ReasoningPlan) {
        let order = plan.execution_order();
        assert_eq!(order.len(), plan.len());
        let mut seen = HashSet::new();
        for step in order {
            for dep in &step.depends_on {
                assert!(seen.contains(dep.as_str()), "{} ran before {}", step.id, dep);
            }
            assert!(seen.insert(step.id.as_str()), "{} scheduled twice", step.id);
        }
    }

    #[test]
    fn test_classify_complexity() {
        assert_eq!(Complexity::classify("What is 2+2?"), Complexity::Simple);
        assert_eq!(
            Complexity::classify(
                "Compare Rust and Go for web services, and explain which is better for startups."
            ),
            Complexity::Moderate
        );
        assert_eq!(Complexity::classify(COMPLEX_PROMPT), Complexity::Complex);
        assert_eq!(Complexity::classify(""), Complexity::Simple);
    }

    #[test]
    fn test_split_compare_cue() {
        let parts = split_subtasks("Compare Rust and Go for web services");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "Analyze Rust");
        assert_eq!(parts[1], "Analyze Go for web services");
    }

    #[test]
    fn test_split_list_is_capped() {
        let parts = split_subtasks(COMPLEX_PROMPT);
        assert_eq!(parts.len(), MAX_SUBTASKS);
        assert!(parts[3].contains("timeline"));
        assert!(parts[3].contains("marketing"));
    }

    #[test]
    fn test_split_fallback_pair() {
        let parts = split_subtasks("Quantum?");
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("Research background"));
    }

    #[test]
    fn test_assign_role() {
        assert_eq!(assign_role("Verify the totals"), hierarchy::FACT_CHECKER);
        assert_eq!(assign_role("What is the origin of tea"), hierarchy::LEAD_RESEARCHER);
        assert_eq!(assign_role("Estimate the market size"), hierarchy::LEAD_ANALYST);
    }

    #[test]
    fn test_simple_plan() {
        let registry = ModelRegistry::builtin();
        let plan = HierarchicalPlanner::default()
            .plan("What is the capital of France?", &registry)
            .unwrap();
        assert_eq!(plan.strategy(), "hierarchical/simple");
        assert_eq!(plan.len(), 2);
        assert_valid_order(&plan);
    }

    #[test]
    fn test_moderate_plan_has_critic_review() {
        let registry = ModelRegistry::builtin();
        let plan = HierarchicalPlanner::default()
            .plan(
                "Compare Rust and Go for web services, and explain which is better for startups.",
                &registry,
            )
            .unwrap();
        assert_eq!(plan.strategy(), "hierarchical/moderate");
        let review = plan.step("cross_review").unwrap();
        assert_eq!(review.assigned_role.as_deref(), Some(hierarchy::CRITIC));
        assert!(plan.steps().iter().all(|s| !s.id.ends_with("_support")));
        assert_valid_order(&plan);
    }

    #[test]
    fn test_complex_plan_adds_assistant_tier() {
        let registry = ModelRegistry::builtin();
        let planner = HierarchicalPlanner::default();
        let plan = planner.plan(COMPLEX_PROMPT, &registry).unwrap();

        assert_eq!(plan.strategy(), "hierarchical/complex");
        assert!(plan.step("quality_review").is_some());

        for step in plan.steps().iter().filter(|s| s.id.ends_with("_support")) {
            let owner = step.assigned_role.as_deref().unwrap();
            assert_eq!(
                planner.hierarchy().get(owner).unwrap().level,
                crate::hierarchy::RoleLevel::Assistant
            );
            let parent_id = step.id.trim_end_matches("_support");
            assert!(plan.step(parent_id).unwrap().depends_on(&step.id));
        }
        assert_eq!(
            plan.steps().iter().filter(|s| s.id.ends_with("_support")).count(),
            MAX_SUBTASKS
        );

        let last = plan.execution_order().last().unwrap().id.clone();
        assert_eq!(last, "synthesize");
        assert_valid_order(&plan);
    }
}
