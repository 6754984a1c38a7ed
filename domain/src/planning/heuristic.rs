//! Template-based planner

use super::plan::{PlanError, ReasoningPlan};
use super::step::{PlanStep, StepRole};
use super::Planner;
use crate::core::model::Capability;
use crate::hierarchy::ModelTier;
use crate::registry::ModelRegistry;

const CANDIDATES_PER_STEP: usize = 3;
const MAX_FOCUS_TAGS: usize = 5;

/// Canned plan shapes the heuristic planner chooses between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTemplate {
    Coding,
    Research,
    Summarization,
    General,
}

impl PlanTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTemplate::Coding => "coding",
            PlanTemplate::Research => "research",
            PlanTemplate::Summarization => "summarization",
            PlanTemplate::General => "general",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            PlanTemplate::Coding => &[
                "code", "function", "bug", "implement", "compile", "debug", "refactor", "rust",
                "python", "api", "script", "program",
            ],
            PlanTemplate::Research => &[
                "research", "history", "evidence", "sources", "study", "investigate", "why",
                "who", "when", "explain",
            ],
            PlanTemplate::Summarization => &[
                "summarize", "summary", "tl;dr", "tldr", "condense", "overview", "recap",
            ],
            PlanTemplate::General => &[],
        }
    }

    /// Pick the template with the most keyword hits; ties resolve in the
    /// order coding, research, summarization.
    pub fn detect(prompt: &str) -> (Self, Vec<String>) {
        let lowered = prompt.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != ';')
            .filter(|t| !t.is_empty())
            .collect();

        let mut best = (PlanTemplate::General, Vec::new());
        for template in [
            PlanTemplate::Coding,
            PlanTemplate::Research,
            PlanTemplate::Summarization,
        ] {
            let hits: Vec<String> = template
                .keywords()
                .iter()
                .filter(|kw| tokens.contains(kw))
                .map(|kw| kw.to_string())
                .collect();
            if hits.len() > best.1.len() {
                best = (template, hits);
            }
        }
        best
    }

    fn confidence(&self) -> f64 {
        match self {
            PlanTemplate::Coding => 0.8,
            PlanTemplate::Research => 0.75,
            PlanTemplate::Summarization => 0.85,
            PlanTemplate::General => 0.6,
        }
    }

    /// Content steps of the template, before critique and synthesis
    fn content_steps(&self) -> Vec<PlanStep> {
        match self {
            PlanTemplate::Coding => vec![
                PlanStep::new("draft_solution", StepRole::Draft, "Write a working solution")
                    .with_capabilities(vec![Capability::Coding, Capability::Reasoning]),
                PlanStep::new(
                    "verify_solution",
                    StepRole::FactCheck,
                    "Check the solution for bugs and unhandled edge cases",
                )
                .with_capabilities(vec![Capability::Coding, Capability::Analysis])
                .with_dependencies(["draft_solution"]),
            ],
            PlanTemplate::Research => vec![
                PlanStep::new("gather_sources", StepRole::Retrieval, "Collect relevant facts"),
                PlanStep::new(
                    "research_answer",
                    StepRole::Research,
                    "Answer using the gathered facts",
                )
                .with_dependencies(["gather_sources"]),
                PlanStep::new(
                    "fact_check",
                    StepRole::FactCheck,
                    "Verify the claims in the answer",
                )
                .with_dependencies(["research_answer"]),
            ],
            PlanTemplate::Summarization => vec![
                PlanStep::new("summarize", StepRole::Draft, "Summarize the material")
                    .with_capabilities(vec![Capability::Summarization]),
            ],
            PlanTemplate::General => vec![
                PlanStep::new("draft_answer", StepRole::Draft, "Answer the prompt directly"),
                PlanStep::new(
                    "alternative_answer",
                    StepRole::Draft,
                    "Answer the prompt from a different angle",
                )
                .with_capabilities(vec![Capability::Reasoning, Capability::Creative]),
            ],
        }
    }
}

/// Pattern-matches a prompt onto a canned template, then appends a
/// cross-critique step and a sequential synthesis step.
#[derive(Debug, Clone, Default)]
pub struct HeuristicPlanner;

impl HeuristicPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl Planner for HeuristicPlanner {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn plan(&self, prompt: &str, registry: &ModelRegistry) -> Result<ReasoningPlan, PlanError> {
        if prompt.trim().is_empty() {
            return Err(PlanError::EmptyPrompt);
        }

        let (template, mut focus) = PlanTemplate::detect(prompt);
        focus.truncate(MAX_FOCUS_TAGS);

        let mut steps = template.content_steps();
        let content_ids: Vec<String> = steps.iter().map(|s| s.id.clone()).collect();

        steps.push(
            PlanStep::new(
                "cross_critique",
                StepRole::Critique,
                "Critique the earlier outputs and flag disagreements",
            )
            .with_dependencies(content_ids.iter().cloned()),
        );
        steps.push(
            PlanStep::new(
                "synthesize",
                StepRole::Synthesize,
                "Merge the outputs and critique into one final answer",
            )
            .with_dependencies(content_ids.into_iter().chain(["cross_critique".to_string()]))
            .sequential(),
        );

        let steps = steps
            .into_iter()
            .map(|step| {
                let tier = if step.role == StepRole::Synthesize {
                    ModelTier::Premium
                } else {
                    ModelTier::Standard
                };
                let candidates = registry.candidates_for_step(
                    &step.required_capabilities,
                    step.role,
                    tier,
                    CANDIDATES_PER_STEP,
                );
                step.with_candidates(candidates)
            })
            .collect();

        Ok(
            ReasoningPlan::new(steps, format!("heuristic/{}", template.as_str()))?
                .with_confidence(template.confidence())
                .with_focus(focus),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_template() {
        assert_eq!(
            PlanTemplate::detect("Please debug this python function").0,
            PlanTemplate::Coding
        );
        assert_eq!(
            PlanTemplate::detect("Summarize this article in one paragraph").0,
            PlanTemplate::Summarization
        );
        assert_eq!(
            PlanTemplate::detect("Explain the history of the printing press").0,
            PlanTemplate::Research
        );
        assert_eq!(PlanTemplate::detect("Hello there").0, PlanTemplate::General);
    }

    #[test]
    fn test_plan_ends_with_critique_and_synthesis() {
        let registry = ModelRegistry::builtin();
        let plan = HeuristicPlanner::new()
            .plan("Fix the bug in this rust function", &registry)
            .unwrap();

        assert_eq!(plan.strategy(), "heuristic/coding");
        let order = plan.execution_order();
        assert_eq!(order.len(), plan.len());

        let last = order.last().unwrap();
        assert_eq!(last.id, "synthesize");
        assert!(!last.parallelizable);

        let critique = plan.step("cross_critique").unwrap();
        assert!(critique.depends_on("draft_solution"));
        assert!(critique.depends_on("verify_solution"));
    }

    #[test]
    fn test_plan_assigns_candidates() {
        let registry = ModelRegistry::builtin();
        let plan = HeuristicPlanner::new()
            .plan("What is a good name for a cat?", &registry)
            .unwrap();
        for step in plan.steps() {
            assert!(!step.candidate_models.is_empty(), "{} has no candidates", step.id);
            assert!(step.candidate_models.len() <= CANDIDATES_PER_STEP);
        }
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let registry = ModelRegistry::builtin();
        assert_eq!(
            HeuristicPlanner::new().plan("   ", &registry).unwrap_err(),
            PlanError::EmptyPrompt
        );
    }
}
