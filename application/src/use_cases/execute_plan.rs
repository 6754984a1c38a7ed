//! Plan execution use case
//!
//! [`BlackboardPlanExecutor`] runs a [`ReasoningPlan`] level by level.
//! Steps inside one level run concurrently; each step goes through the
//! router's fallback path and writes its output to the blackboard under
//! `step:<id>` and onto the `outputs` list.

use crate::ports::plan_executor::{
    ExecutePlanError, PlanExecution, PlanExecutor, StepReport, StepStatus,
};
use crate::ports::run_logger::RunEvent;
use crate::use_cases::route_query::{ModelRouter, RouterError};
use async_trait::async_trait;
use conclave_domain::{
    Blackboard, Domain, PlanStep, PromptTemplate, ReasoningPlan, RoutingDecision, RoutingMode,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Blackboard key holding the output of step `id`
pub fn step_key(id: &str) -> String {
    format!("step:{id}")
}

pub struct BlackboardPlanExecutor {
    router: Arc<ModelRouter>,
}

impl BlackboardPlanExecutor {
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self { router }
    }

    async fn run_step(&self, task: &str, step: &PlanStep, board: &Blackboard) -> StepReport {
        let report = |status, model: Option<String>, detail: Option<String>| StepReport {
            step_id: step.id.clone(),
            status,
            model,
            detail,
        };

        if let Some(missing) = step
            .depends_on
            .iter()
            .find(|dep| !board.contains(&step_key(dep)))
        {
            warn!("Skipping step {}: no output from {}", step.id, missing);
            return report(
                StepStatus::Skipped,
                None,
                Some(format!("missing output from {missing}")),
            );
        }

        let inputs: Vec<(String, String)> = step
            .depends_on
            .iter()
            .map(|dep| (dep.clone(), board.get_str(&step_key(dep)).unwrap_or_default()))
            .collect();
        let prompt = PromptTemplate::step(task, step, &inputs);

        let decision = match self.decision_for(task, step) {
            Ok(decision) => decision,
            Err(e) => return report(StepStatus::Failed, None, Some(e.to_string())),
        };

        debug!("Running step {} on {}", step.id, decision.primary_model);
        match self.router.execute_with_fallback(&prompt, &decision).await {
            Ok(result) => {
                let response = result.response;
                board.set(&step_key(&step.id), response.content.as_str());
                board.append(
                    "outputs",
                    json!({
                        "step": step.id,
                        "model": response.model,
                        "content": response.content,
                    }),
                );
                let detail = (!response.passed).then(|| "degraded".to_string());
                report(StepStatus::Completed, Some(response.model), detail)
            }
            Err(e) => {
                warn!("Step {} failed: {}", step.id, e);
                report(StepStatus::Failed, None, Some(e.to_string()))
            }
        }
    }

    /// The step's own candidates when any are routable, otherwise a
    /// speed-mode routing decision for its description
    fn decision_for(
        &self,
        task: &str,
        step: &PlanStep,
    ) -> Result<RoutingDecision, RouterError> {
        let clients = self.router.clients();
        let mut candidates = step
            .candidate_models
            .iter()
            .filter(|m| clients.contains(m))
            .cloned();
        match candidates.next() {
            Some(primary) => Ok(RoutingDecision::single(
                primary,
                candidates.collect(),
                Domain::classify(task),
                0.5,
                format!("candidates of step {}", step.id),
            )),
            None => self.router.decide(&step.description, RoutingMode::Speed),
        }
    }
}

#[async_trait]
impl PlanExecutor for BlackboardPlanExecutor {
    async fn execute(
        &self,
        task: &str,
        plan: &ReasoningPlan,
        board: &Blackboard,
    ) -> Result<PlanExecution, ExecutePlanError> {
        let batches = plan.execution_batches();
        info!(
            "Executing plan '{}' ({} steps in {} batches)",
            plan.strategy(),
            plan.len(),
            batches.len()
        );

        let mut steps = Vec::with_capacity(plan.len());
        for batch in batches {
            let reports =
                futures::future::join_all(batch.iter().map(|step| self.run_step(task, step, board)))
                    .await;
            steps.extend(reports);
        }

        let final_output = steps
            .iter()
            .rev()
            .find(|r| r.status == StepStatus::Completed)
            .and_then(|r| board.get_str(&step_key(&r.step_id)));

        let execution = PlanExecution {
            steps,
            final_output,
        };
        self.router.logger().log(RunEvent::new(
            "plan",
            json!({
                "strategy": plan.strategy(),
                "steps": plan.len(),
                "completed": execution.completed(),
            }),
        ));

        if execution.final_output.is_none() {
            return Err(ExecutePlanError::NoOutput);
        }
        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{ScriptedClient, router_for, solid};
    use conclave_domain::StepRole;

    fn plan_abc() -> ReasoningPlan {
        ReasoningPlan::new(
            vec![
                PlanStep::new("a", StepRole::Draft, "Draft alpha").with_candidates(vec!["m1".into()]),
                PlanStep::new("b", StepRole::Research, "Research beta")
                    .with_candidates(vec!["m2".into()]),
                PlanStep::new("c", StepRole::Synthesize, "Combine gamma")
                    .with_dependencies(["a", "b"])
                    .with_candidates(vec!["m1".into()])
                    .sequential(),
            ],
            "test",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_dependent_step_sees_both_outputs() {
        let client = Arc::new(
            ScriptedClient::new()
                .when("m1", "Combine gamma", &solid("Final combined answer."))
                .when("m1", "Draft alpha", &solid("Alpha output."))
                .answer("m2", &solid("Beta output.")),
        );
        let executor = BlackboardPlanExecutor::new(Arc::new(router_for(client.clone(), &["m1", "m2"])));
        let board = Blackboard::new();

        let execution = executor.execute("task", &plan_abc(), &board).await.unwrap();

        assert_eq!(execution.completed(), 3);
        assert!(execution.final_output.unwrap().contains("Final combined"));
        let calls = client.calls();
        let (_, c_prompt) = calls.last().unwrap();
        assert!(c_prompt.contains("Alpha output."));
        assert!(c_prompt.contains("Beta output."));
        assert_eq!(
            board.get("outputs").unwrap().as_array().unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_failed_dependency_skips_dependent() {
        let client = Arc::new(
            ScriptedClient::new()
                .answer("m1", &solid("Alpha output."))
                .failing("m2"),
        );
        let executor = BlackboardPlanExecutor::new(Arc::new(router_for(client.clone(), &["m1", "m2"])));
        let board = Blackboard::new();

        let execution = executor.execute("task", &plan_abc(), &board).await.unwrap();
        let statuses: Vec<(&str, StepStatus)> = execution
            .steps
            .iter()
            .map(|r| (r.step_id.as_str(), r.status))
            .collect();
        assert!(statuses.contains(&("b", StepStatus::Failed)));
        assert!(statuses.contains(&("c", StepStatus::Skipped)));
        assert!(!board.contains("step:c"));
        assert_eq!(execution.final_output.as_deref(), Some(solid("Alpha output.").as_str()));
    }

    #[tokio::test]
    async fn test_nothing_completes() {
        let client = Arc::new(ScriptedClient::new().failing("m1").failing("m2"));
        let executor = BlackboardPlanExecutor::new(Arc::new(router_for(client, &["m1", "m2"])));
        let result = executor.execute("task", &plan_abc(), &Blackboard::new()).await;
        assert!(matches!(result, Err(ExecutePlanError::NoOutput)));
    }

    #[tokio::test]
    async fn test_unroutable_candidates_fall_back_to_router() {
        let client = Arc::new(ScriptedClient::new().answer("m1", &solid("Routed answer.")));
        let executor = BlackboardPlanExecutor::new(Arc::new(router_for(client, &["m1"])));
        let plan = ReasoningPlan::new(
            vec![PlanStep::new("only", StepRole::Draft, "Say something")
                .with_candidates(vec!["ghost".into()])],
            "test",
        )
        .unwrap();

        let execution = executor.execute("task", &plan, &Blackboard::new()).await.unwrap();
        assert_eq!(execution.steps[0].model.as_deref(), Some("m1"));
    }
}
