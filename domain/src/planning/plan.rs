//! Reasoning plan: validated, dependency-ordered steps.

use super::step::PlanStep;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Reasons a set of steps cannot form a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Plan has no steps")]
    NoSteps,

    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("Step {0} depends on itself")]
    SelfDependency(String),

    #[error("Step {step} depends on unknown step {dependency}")]
    UnknownDependency { step: String, dependency: String },

    #[error("Dependency cycle among steps: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// Ordered steps plus planning metadata. Built once per request and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningPlan {
    steps: Vec<PlanStep>,
    strategy: String,
    confidence: f64,
    focus: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_summary: Option<String>,
}

impl ReasoningPlan {
    /// Validate `steps` and build a plan.
    ///
    /// Rejects duplicate ids, self-dependencies, dependencies on unknown
    /// steps and dependency cycles.
    pub fn new(steps: Vec<PlanStep>, strategy: impl Into<String>) -> Result<Self, PlanError> {
        validate(&steps)?;
        Ok(Self {
            steps,
            strategy: strategy.into(),
            confidence: 0.5,
            focus: Vec::new(),
            context_summary: None,
        })
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_focus(mut self, focus: Vec<String>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_context_summary(mut self, summary: impl Into<String>) -> Self {
        self.context_summary = Some(summary.into());
        self
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn focus(&self) -> &[String] {
        &self.focus
    }

    pub fn context_summary(&self) -> Option<&str> {
        self.context_summary.as_deref()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps grouped into batches that may start together.
    ///
    /// Each pass collects the steps whose dependencies all completed in
    /// earlier batches. Parallelizable steps share a batch; a step marked
    /// sequential gets a batch of its own. The loop is capped at twice the
    /// step count.
    pub fn execution_batches(&self) -> Vec<Vec<&PlanStep>> {
        let mut batches = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut remaining: Vec<&PlanStep> = self.steps.iter().collect();
        let max_iterations = 2 * self.steps.len();

        let mut iteration = 0;
        while !remaining.is_empty() && iteration < max_iterations {
            iteration += 1;

            let (ready, blocked): (Vec<&PlanStep>, Vec<&PlanStep>) = remaining
                .into_iter()
                .partition(|s| s.depends_on.iter().all(|d| done.contains(d.as_str())));
            remaining = blocked;

            if ready.is_empty() {
                break;
            }
            done.extend(ready.iter().map(|s| s.id.as_str()));

            let (parallel, sequential): (Vec<&PlanStep>, Vec<&PlanStep>) =
                ready.into_iter().partition(|s| s.parallelizable);
            if !parallel.is_empty() {
                batches.push(parallel);
            }
            batches.extend(sequential.into_iter().map(|s| vec![s]));
        }
        batches
    }

    /// Flattened [`execution_batches`](Self::execution_batches)
    pub fn execution_order(&self) -> Vec<&PlanStep> {
        self.execution_batches().into_iter().flatten().collect()
    }
}

fn validate(steps: &[PlanStep]) -> Result<(), PlanError> {
    if steps.is_empty() {
        return Err(PlanError::NoSteps);
    }

    let mut ids: HashSet<&str> = HashSet::new();
    for step in steps {
        if !ids.insert(step.id.as_str()) {
            return Err(PlanError::DuplicateStep(step.id.clone()));
        }
    }

    for step in steps {
        for dep in &step.depends_on {
            if dep == &step.id {
                return Err(PlanError::SelfDependency(step.id.clone()));
            }
            if !ids.contains(dep.as_str()) {
                return Err(PlanError::UnknownDependency {
                    step: step.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    // Kahn's algorithm: whatever cannot be peeled off sits on a cycle
    let mut in_degree: HashMap<&str, usize> = steps
        .iter()
        .map(|s| (s.id.as_str(), s.depends_on.len()))
        .collect();
    let mut queue: VecDeque<&str> = steps
        .iter()
        .filter(|s| s.depends_on.is_empty())
        .map(|s| s.id.as_str())
        .collect();
    let mut visited = 0;

    while let Some(id) = queue.pop_front() {
        visited += 1;
        for dependent in steps.iter().filter(|s| s.depends_on(id)) {
            if let Some(degree) = in_degree.get_mut(dependent.id.as_str()) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent.id.as_str());
                }
            }
        }
    }

    if visited < steps.len() {
        let cyclic = steps
            .iter()
            .filter(|s| in_degree.get(s.id.as_str()).is_some_and(|d| *d > 0))
            .map(|s| s.id.clone())
            .collect();
        return Err(PlanError::Cycle(cyclic));
    }

    Ok(())
}
