//! Application layer for conclave
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.
//!
//! Long-lived services are built once per process and shared by `Arc`:
//! the [`ClientRegistry`] (model name → provider), the
//! [`PerformanceTracker`] and the [`ModelRouter`] that ties them together.
//! Every other use case borrows the router.

pub mod clients;
pub mod config;
pub mod ports;
pub mod tracker;
pub mod use_cases;

// Re-export commonly used types
pub use clients::ClientRegistry;
pub use config::{
    ConsensusConfig, DiffusionConfig, EnsembleConfig, OrchestrationConfig, RouterConfig,
};
pub use ports::{
    model_client::{ClientError, ModelClient},
    performance_store::{NullPerformanceStore, PerformanceStore, StoreError},
    plan_executor::{ExecutePlanError, PlanExecution, PlanExecutor, StepReport, StepStatus},
    progress::{NoProgress, ProgressNotifier},
    run_logger::{NoRunLogger, RunEvent, RunLogger},
};
pub use tracker::PerformanceTracker;
pub use use_cases::adaptive_ensemble::{AdaptiveEnsemble, EnsembleError, EnsembleRun};
pub use use_cases::build_consensus::{ConsensusEngine, ConsensusError};
pub use use_cases::diffuse_prompt::{DiffusionError, PromptDiffusion};
pub use use_cases::execute_plan::BlackboardPlanExecutor;
pub use use_cases::orchestrate::{OrchestrateError, OrchestrateInput, Orchestrator};
pub use use_cases::route_query::{FallbackResult, ModelRouter, RouterError};
