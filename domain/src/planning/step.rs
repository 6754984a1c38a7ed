//! Plan step value objects

use crate::core::model::Capability;
use serde::{Deserialize, Serialize};

/// What a plan step contributes to the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    Draft,
    Research,
    FactCheck,
    Critique,
    Synthesize,
    Retrieval,
}

impl StepRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepRole::Draft => "draft",
            StepRole::Research => "research",
            StepRole::FactCheck => "fact_check",
            StepRole::Critique => "critique",
            StepRole::Synthesize => "synthesize",
            StepRole::Retrieval => "retrieval",
        }
    }

    /// Capabilities a model needs to perform this role well
    pub fn default_capabilities(&self) -> Vec<Capability> {
        match self {
            StepRole::Draft => vec![Capability::Reasoning],
            StepRole::Research => vec![Capability::Research, Capability::Reasoning],
            StepRole::FactCheck => vec![Capability::FactChecking],
            StepRole::Critique => vec![Capability::Reasoning, Capability::Analysis],
            StepRole::Synthesize => vec![Capability::Reasoning, Capability::Summarization],
            StepRole::Retrieval => vec![Capability::Research, Capability::Fast],
        }
    }
}

impl std::fmt::Display for StepRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of work in a reasoning plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub role: StepRole,
    pub description: String,
    pub required_capabilities: Vec<Capability>,
    /// Models to try, best first
    pub candidate_models: Vec<String>,
    /// Step ids whose output this step consumes
    pub depends_on: Vec<String>,
    pub parallelizable: bool,
    /// Role-hierarchy role owning this step, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<String>,
}

impl PlanStep {
    pub fn new(id: impl Into<String>, role: StepRole, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            description: description.into(),
            required_capabilities: role.default_capabilities(),
            candidate_models: Vec::new(),
            depends_on: Vec::new(),
            parallelizable: true,
            assigned_role: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.required_capabilities = capabilities;
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_candidates(mut self, models: Vec<String>) -> Self {
        self.candidate_models = models;
        self
    }

    pub fn with_assigned_role(mut self, role: impl Into<String>) -> Self {
        self.assigned_role = Some(role.into());
        self
    }

    /// Mark the step as one that must run on its own
    pub fn sequential(mut self) -> Self {
        self.parallelizable = false;
        self
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.depends_on.iter().any(|d| d == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_defaults() {
        let step = PlanStep::new("s1", StepRole::FactCheck, "verify");
        assert!(step.parallelizable);
        assert_eq!(step.required_capabilities, vec![Capability::FactChecking]);
        assert!(step.depends_on.is_empty());
    }

    #[test]
    fn test_step_builder() {
        let step = PlanStep::new("s2", StepRole::Synthesize, "merge")
            .with_dependencies(["s1", "s0"])
            .sequential();
        assert!(!step.parallelizable);
        assert!(step.depends_on("s1"));
        assert!(!step.depends_on("s2"));
    }

    #[test]
    fn test_step_role_serde() {
        let json = serde_json::to_string(&StepRole::FactCheck).unwrap();
        assert_eq!(json, "\"fact_check\"");
    }
}
