//! Plan executor port
//!
//! Runs a [`ReasoningPlan`] against real models, writing each step's output
//! to a [`Blackboard`]. A step may only start once every step it depends on
//! has produced output there.

use async_trait::async_trait;
use conclave_domain::{Blackboard, ReasoningPlan};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutePlanError {
    #[error("No plan step produced output")]
    NoOutput,
}

/// What happened to one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
    /// Not run because a dependency has no output
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step_id: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Summary of a plan run; step outputs themselves live on the blackboard
#[derive(Debug, Clone, Serialize)]
pub struct PlanExecution {
    pub steps: Vec<StepReport>,
    /// Output of the last step that completed in execution order
    pub final_output: Option<String>,
}

impl PlanExecution {
    pub fn completed(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }
}

#[async_trait]
pub trait PlanExecutor: Send + Sync {
    async fn execute(
        &self,
        task: &str,
        plan: &ReasoningPlan,
        board: &Blackboard,
    ) -> Result<PlanExecution, ExecutePlanError>;
}
