//! Reasoning planning
//!
//! A [`Planner`] turns a raw prompt into a [`ReasoningPlan`]: role-tagged
//! steps with explicit dependencies, validated when the plan is built.

pub mod heuristic;
pub mod hierarchical;
pub mod plan;
pub mod step;

pub use heuristic::{HeuristicPlanner, PlanTemplate};
pub use hierarchical::{Complexity, HierarchicalPlanner};
pub use plan::{PlanError, ReasoningPlan};
pub use step::{PlanStep, StepRole};

use crate::registry::ModelRegistry;

/// Strategy that decomposes a prompt into plan steps
pub trait Planner: Send + Sync {
    /// Short identifier used in logs and output
    fn name(&self) -> &'static str;

    /// Build a plan for `prompt`, choosing step candidates from `registry`
    fn plan(&self, prompt: &str, registry: &ModelRegistry) -> Result<ReasoningPlan, PlanError>;
}
