//! Console output formatter for orchestration results

use colored::Colorize;
use conclave_application::{PlanExecution, StepStatus};
use conclave_domain::{
    ConfigIssue, OrchestrationOutcome, PerformanceSnapshot, ReasoningPlan, RoleHierarchy,
    RoutingDecision,
};
use serde::Serialize;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Full answer with the routing and agreement details behind it
    pub fn outcome(outcome: &OrchestrationOutcome) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Conclave Answer"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Question:".cyan().bold(), outcome.query));
        if outcome.effective_prompt != outcome.query {
            output.push_str(&format!(
                "{} {}\n",
                "Refined prompt:".cyan().bold(),
                outcome.effective_prompt
            ));
        }
        output.push_str(&format!(
            "{} {} ({})\n",
            "Strategy:".cyan().bold(),
            outcome.strategy,
            outcome.decision.domain
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Models:".cyan().bold(),
            outcome.decision.selected_models.join(", ")
        ));

        if !outcome.responses.is_empty() {
            output.push_str(&Self::section_header("Responses"));
            for response in &outcome.responses {
                let label = format!("── {} ──", response.model);
                if response.passed {
                    output.push_str(&format!(
                        "{} quality {:.2}, confidence {:.2}\n",
                        label.green().bold(),
                        response.quality_score,
                        response.confidence
                    ));
                } else {
                    output.push_str(&format!(
                        "{} {}\n",
                        label.red().bold(),
                        response
                            .failure_reason
                            .as_deref()
                            .unwrap_or("below quality threshold")
                    ));
                }
            }
        }

        if let Some(consensus) = &outcome.consensus {
            output.push_str(&Self::section_header("Consensus"));
            output.push_str(&format!(
                "{} rounds, score {:.2}{}\n",
                consensus.rounds_completed(),
                consensus.consensus_score,
                if consensus.converged { ", converged" } else { "" }
            ));
            for (a, b) in &consensus.conflicts {
                output.push_str(&format!("  {} {} vs {}\n", "conflict:".yellow(), a, b));
            }
            if !consensus.contributions.is_empty() {
                let shares: Vec<String> = consensus
                    .contributions
                    .iter()
                    .map(|(model, share)| format!("{model} {:.0}%", share * 100.0))
                    .collect();
                output.push_str(&format!("  {} {}\n", "contributions:".dimmed(), shares.join(", ")));
            }
        }

        if let Some(ensemble) = &outcome.ensemble {
            output.push_str(&Self::section_header("Ensemble"));
            for vote in &ensemble.votes {
                output.push_str(&format!(
                    "  {} weight {:.2}, score {:.3}\n",
                    vote.model,
                    vote.weight,
                    vote.score()
                ));
            }
            for event in &ensemble.switching_events {
                output.push_str(&format!(
                    "  {} {} ({}){}\n",
                    "failed:".red(),
                    event.failed_model,
                    event.reason,
                    event
                        .backup_model
                        .as_deref()
                        .map(|b| format!(", backup {b}"))
                        .unwrap_or_default()
                ));
            }
        }

        output.push_str(&Self::section_header("Answer"));
        output.push_str(&outcome.answer);
        output.push('\n');
        output.push_str(&format!(
            "\n{}\n",
            format!(
                "confidence {:.2} · {} ms",
                outcome.confidence(),
                outcome.latency_ms
            )
            .dimmed()
        ));
        output.push_str(&Self::footer());
        output
    }

    pub fn decision(decision: &RoutingDecision) -> String {
        let mut output = String::new();
        output.push_str(&format!("{} {}\n", "Domain:".cyan().bold(), decision.domain));
        output.push_str(&format!(
            "{} {}\n",
            "Primary:".cyan().bold(),
            decision.primary_model.yellow()
        ));
        if !decision.fallback_models.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Fallbacks:".cyan().bold(),
                decision.fallback_models.join(" → ")
            ));
        }
        if decision.use_ensemble {
            output.push_str(&format!(
                "{} {} models\n",
                "Ensemble:".cyan().bold(),
                decision.ensemble_size
            ));
        }
        output.push_str(&format!(
            "{} {:.2}\n{} {}\n",
            "Confidence:".cyan().bold(),
            decision.confidence,
            "Rationale:".cyan().bold(),
            decision.rationale
        ));
        output
    }

    /// Plan steps in execution order, with run status when executed
    pub fn plan(plan: &ReasoningPlan, execution: Option<&PlanExecution>) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Reasoning Plan"));
        output.push('\n');
        output.push_str(&format!(
            "{} {} (confidence {:.2})\n",
            "Strategy:".cyan().bold(),
            plan.strategy(),
            plan.confidence()
        ));
        if !plan.focus().is_empty() {
            output.push_str(&format!("{} {}\n", "Focus:".cyan().bold(), plan.focus().join(", ")));
        }

        for (level, batch) in plan.execution_batches().iter().enumerate() {
            output.push_str(&Self::section_header(&format!("Level {}", level + 1)));
            for step in batch {
                let status = execution
                    .and_then(|e| e.steps.iter().find(|s| s.step_id == step.id))
                    .map(|report| match report.status {
                        StepStatus::Completed => " ✓".green().to_string(),
                        StepStatus::Failed => " ✗".red().to_string(),
                        StepStatus::Skipped => " -".dimmed().to_string(),
                    })
                    .unwrap_or_default();
                output.push_str(&format!(
                    "{}{} [{}] {}\n",
                    step.id.yellow().bold(),
                    status,
                    step.role,
                    step.description
                ));
                if !step.depends_on.is_empty() {
                    output.push_str(&format!(
                        "    {} {}\n",
                        "after:".dimmed(),
                        step.depends_on.join(", ")
                    ));
                }
                if !step.candidate_models.is_empty() {
                    output.push_str(&format!(
                        "    {} {}\n",
                        "models:".dimmed(),
                        step.candidate_models.join(", ")
                    ));
                }
            }
        }

        if let Some(final_output) = execution.and_then(|e| e.final_output.as_deref()) {
            output.push_str(&Self::section_header("Result"));
            output.push_str(final_output);
            output.push('\n');
        }
        output.push_str(&Self::footer());
        output
    }

    pub fn stats(snapshot: &PerformanceSnapshot) -> String {
        if snapshot.is_empty() {
            return format!("{}\n", "No performance recorded yet.".dimmed());
        }
        let mut output = format!(
            "{:<24} {:>6} {:>8} {:>12} {:>8} {:>10} {:>9}\n",
            "MODEL".bold(),
            "CALLS".bold(),
            "SUCCESS".bold(),
            "RUNS".bold(),
            "QUALITY".bold(),
            "LATENCY".bold(),
            "COST".bold()
        );
        for (model, perf) in snapshot.iter() {
            let latency = perf
                .avg_latency_ms()
                .map(|ms| format!("{ms:.0} ms"))
                .unwrap_or_else(|| "-".to_string());
            let runs = perf
                .query_accuracy()
                .map(|rate| format!("{} ({:.0}%)", perf.query_runs, rate * 100.0))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<24} {:>6} {:>7.0}% {:>12} {:>8.2} {:>10} {:>9.4}\n",
                model,
                perf.calls,
                perf.success_rate() * 100.0,
                runs,
                perf.avg_quality(),
                latency,
                perf.total_cost
            ));
        }
        output
    }

    pub fn roles(hierarchy: &RoleHierarchy) -> String {
        let mut output = String::new();
        Self::role_tree(hierarchy, &hierarchy.root().name, 0, &mut output);
        output
    }

    fn role_tree(hierarchy: &RoleHierarchy, name: &str, depth: usize, output: &mut String) {
        let Some(role) = hierarchy.get(name) else {
            return;
        };
        output.push_str(&format!(
            "{}{} {}\n",
            "  ".repeat(depth),
            role.name.yellow().bold(),
            format!("({}, {} tier)", role.level, role.level.model_tier()).dimmed()
        ));
        for child in &role.children {
            Self::role_tree(hierarchy, child, depth + 1, output);
        }
    }

    /// Validation issues, errors first
    pub fn issues(issues: &[ConfigIssue]) -> String {
        if issues.is_empty() {
            return format!("{}\n", "Configuration is valid.".green());
        }
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|issue| !issue.is_error());
        sorted
            .iter()
            .map(|issue| {
                let label = if issue.is_error() {
                    "error:".red().bold()
                } else {
                    "warning:".yellow().bold()
                };
                format!("{} {}\n", label, issue.message)
            })
            .collect()
    }

    /// Pretty JSON for any serializable result
    pub fn json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::{
        AnswerStrategy, ConfigIssueCode, Domain, HeuristicPlanner, ModelPerformance,
        ModelRegistry, Planner,
    };
    use std::collections::BTreeMap;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_decision_lists_fallbacks() {
        plain();
        let decision = RoutingDecision::single(
            "gpt-4o",
            vec!["claude-3-5-haiku".to_string()],
            Domain::Coding,
            0.8,
            "best coding fit",
        );
        let text = ConsoleFormatter::decision(&decision);
        assert!(text.contains("gpt-4o"));
        assert!(text.contains("claude-3-5-haiku"));
        assert!(text.contains("best coding fit"));
    }

    #[test]
    fn test_outcome_shows_answer() {
        plain();
        let outcome = OrchestrationOutcome {
            query: "Capital of France?".to_string(),
            effective_prompt: "Capital of France?".to_string(),
            answer: "Paris.".to_string(),
            strategy: AnswerStrategy::Single,
            decision: RoutingDecision::single("m", vec![], Domain::General, 0.5, "only model"),
            responses: vec![],
            diffusion: None,
            consensus: None,
            ensemble: None,
            latency_ms: 12,
        };
        let text = ConsoleFormatter::outcome(&outcome);
        assert!(text.contains("Paris."));
        assert!(!text.contains("Refined prompt"));
    }

    #[test]
    fn test_plan_lists_every_step() {
        plain();
        let plan = HeuristicPlanner::new()
            .plan("Research and compare Rust and Go", &ModelRegistry::builtin())
            .unwrap();
        let text = ConsoleFormatter::plan(&plan, None);
        for step in plan.steps() {
            assert!(text.contains(&step.id));
        }
    }

    #[test]
    fn test_stats_empty_and_filled() {
        plain();
        assert!(ConsoleFormatter::stats(&PerformanceSnapshot::default()).contains("No performance"));

        let mut perf = ModelPerformance::new("gpt-4o");
        perf.record_usage(10, 0.0, 0.9);
        perf.mark_outcome(true, Domain::General);
        let snapshot = PerformanceSnapshot::new(BTreeMap::from([("gpt-4o".to_string(), perf)]));
        let text = ConsoleFormatter::stats(&snapshot);
        assert!(text.contains("gpt-4o"));
        assert!(text.contains("100%"));
        assert!(!text.contains("(0%)"));
    }

    #[test]
    fn test_stats_show_request_accuracy() {
        plain();
        let mut perf = ModelPerformance::new("claude");
        perf.record_run(true, 100);
        perf.record_run(true, 100);
        perf.record_run(false, 100);
        perf.record_run(false, 100);
        let snapshot = PerformanceSnapshot::new(BTreeMap::from([("claude".to_string(), perf)]));
        let text = ConsoleFormatter::stats(&snapshot);
        assert!(text.contains("4 (50%)"));
    }

    #[test]
    fn test_roles_render_tree() {
        plain();
        let hierarchy = RoleHierarchy::standard();
        let text = ConsoleFormatter::roles(&hierarchy);
        assert!(text.starts_with(&hierarchy.root().name));
        assert_eq!(text.lines().count(), hierarchy.roles().count());
    }

    #[test]
    fn test_issues_put_errors_first() {
        plain();
        let issues = vec![
            ConfigIssue::warning(
                ConfigIssueCode::ProviderUnavailable {
                    provider: "ollama".to_string(),
                },
                "ollama missing",
            ),
            ConfigIssue::error(ConfigIssueCode::EmptyModelName, "empty name"),
        ];
        let text = ConsoleFormatter::issues(&issues);
        assert!(text.find("empty name") < text.find("ollama missing"));
    }
}
