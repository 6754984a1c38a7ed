//! Domain layer for conclave
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Routing
//!
//! A query is classified into a [`Domain`], checked for importance and
//! complexity ([`QueryTraits`]) and turned into a [`RoutingDecision`]: one
//! model with a fallback chain, or an ensemble.
//!
//! ## Planning
//!
//! A [`Planner`] decomposes a prompt into a [`ReasoningPlan`] of role-tagged
//! [`PlanStep`]s. The [`RoleHierarchy`] decides who may delegate to whom and
//! which model tier each role gets.
//!
//! ## Agreement
//!
//! - **Consensus**: disagreeing answers are critiqued, refined and debated
//!   until their [`DebateRound`] scores converge
//! - **Adaptive ensemble**: answers are weighted by each model's history
//!   and voted on ([`EnsembleVote`])
//! - **Prompt diffusion**: the prompt itself is rewritten and judged before
//!   anyone answers it ([`PromptVersion`])

pub mod blackboard;
pub mod consensus;
pub mod core;
pub mod diffusion;
pub mod ensemble;
pub mod hierarchy;
pub mod orchestration;
pub mod parsing;
pub mod performance;
pub mod planning;
pub mod prompt;
pub mod quality;
pub mod registry;
pub mod routing;

// Re-export commonly used types
pub use blackboard::{Blackboard, BlackboardEntry, BlackboardOp};
pub use consensus::{ConsensusResult, Critique, DebateRound};
pub use core::{
    error::DomainError,
    model::{Capability, ModelProfile},
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use diffusion::{DiffusionResult, PromptVersion, RefinementRole};
pub use ensemble::{EnsembleResult, EnsembleVote, SwitchingEvent};
pub use hierarchy::{ModelTier, Permission, Role, RoleHierarchy, RoleLevel};
pub use orchestration::{AnswerStrategy, OrchestrationOutcome, Phase};
pub use performance::{DomainStats, ModelPerformance, PerformanceSnapshot};
pub use planning::{
    Complexity, HeuristicPlanner, HierarchicalPlanner, PlanError, PlanStep, Planner,
    ReasoningPlan, StepRole,
};
pub use prompt::PromptTemplate;
pub use quality::{
    CallOutcome, Completion, HeuristicQualityScorer, ModelResponse, QualityAssessment,
    QualityScorer,
};
pub use registry::ModelRegistry;
pub use routing::{Domain, QueryTraits, RoutingDecision, RoutingMode};
