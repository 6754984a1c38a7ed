//! Adaptive ensemble use case
//!
//! Picks a performance-weighted subset of models, runs them concurrently
//! and votes. Votes within `synthesis_ratio` of the best are merged by a
//! synthesis call; otherwise the top vote stands alone.

use crate::config::EnsembleConfig;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::RunEvent;
use crate::use_cases::route_query::ModelRouter;
use conclave_domain::ensemble::{leading_votes, model_weight, selection_score};
use conclave_domain::{
    Domain, EnsembleResult, EnsembleVote, ModelResponse, Phase, PromptTemplate, SwitchingEvent,
};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnsembleError {
    #[error("No models available for the ensemble")]
    NoCandidates,

    #[error("Every ensemble member failed: {}", attempted.join(", "))]
    AllModelsFailed { attempted: Vec<String> },

    #[error("Ensemble needs at least {required} models, only {available} available")]
    TooFewModels { available: usize, required: usize },
}

/// Ensemble result plus the raw responses it was built from
#[derive(Debug, Clone)]
pub struct EnsembleRun {
    pub result: EnsembleResult,
    pub responses: Vec<ModelResponse>,
}

pub struct AdaptiveEnsemble {
    router: Arc<ModelRouter>,
    config: EnsembleConfig,
}

impl AdaptiveEnsemble {
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self {
            router,
            config: EnsembleConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EnsembleConfig) -> Self {
        self.config = config;
        self
    }

    /// Available models ranked by performance (60%) and capability fit (40%)
    fn ranked_candidates(&self, domain: Domain) -> Vec<(String, f64)> {
        let snapshot = self.router.tracker().snapshot();
        let requested = domain.preferred_capabilities();
        let mut ranked: Vec<(String, f64)> = self
            .router
            .available_profiles()
            .into_iter()
            .map(|p| {
                let score = selection_score(snapshot.get(&p.name), p.coverage(&requested));
                (p.name.clone(), score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Best `max_models` candidates for `domain`
    pub fn select_models(&self, domain: Domain) -> Vec<String> {
        self.ranked_candidates(domain)
            .into_iter()
            .take(self.config.max_models)
            .map(|(name, _)| name)
            .collect()
    }

    /// Execute the use case with default (no-op) progress
    pub async fn run(&self, prompt: &str) -> Result<EnsembleRun, EnsembleError> {
        self.run_with_progress(prompt, &NoProgress).await
    }

    pub async fn run_with_progress(
        &self,
        prompt: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<EnsembleRun, EnsembleError> {
        let domain = Domain::classify(prompt);
        let selected = self.select_models(domain);
        if selected.is_empty() {
            return Err(EnsembleError::NoCandidates);
        }
        if selected.len() < self.config.min_models {
            return Err(EnsembleError::TooFewModels {
                available: selected.len(),
                required: self.config.min_models,
            });
        }
        let mut backups = self
            .ranked_candidates(domain)
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| !selected.contains(name))
            .collect::<Vec<_>>()
            .into_iter();

        // Weights come from history as it stood before this pass
        let snapshot = self.router.tracker().snapshot();

        info!("Adaptive ensemble over {} models", selected.len());
        progress.on_phase_start(Phase::Answering, selected.len());
        let mut pending: FuturesUnordered<_> = selected
            .iter()
            .map(|model| self.router.call_model(model, prompt, domain))
            .collect();
        let mut responses = Vec::with_capacity(selected.len());
        while let Some(response) = pending.next().await {
            progress.on_model_complete(Phase::Answering, &response.model, response.has_content());
            responses.push(response);
        }
        drop(pending);
        progress.on_phase_complete(Phase::Answering);
        responses.sort_by_key(|r| selected.iter().position(|m| m == &r.model));

        let mut votes = Vec::new();
        let mut switching_events = Vec::new();
        for response in &responses {
            if !response.has_content() {
                let reason = response
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| "empty response".to_string());
                let backup_model = backups.next();
                warn!(
                    "Ensemble member {} failed ({}); backup: {}",
                    response.model,
                    reason,
                    backup_model.as_deref().unwrap_or("none")
                );
                self.router.logger().log(RunEvent::new(
                    "model_switch",
                    json!({ "failed": response.model, "reason": reason, "backup": backup_model }),
                ));
                switching_events.push(SwitchingEvent {
                    failed_model: response.model.clone(),
                    reason,
                    backup_model,
                });
                continue;
            }
            votes.push(EnsembleVote {
                model: response.model.clone(),
                content: response.content.clone(),
                weight: model_weight(snapshot.get(&response.model)),
                confidence: response.confidence,
                quality_score: response.quality_score,
            });
        }
        if votes.is_empty() {
            return Err(EnsembleError::AllModelsFailed { attempted: selected });
        }

        progress.on_phase_start(Phase::Voting, votes.len());
        let leading: Vec<EnsembleVote> = leading_votes(&votes, self.config.synthesis_ratio)
            .into_iter()
            .cloned()
            .collect();
        progress.on_phase_complete(Phase::Voting);

        let (final_answer, contributors, synthesized) = self.combine(prompt, &leading, progress).await;

        self.router.logger().log(RunEvent::new(
            "ensemble",
            json!({
                "selected": selected,
                "votes": votes.len(),
                "contributors": contributors,
                "synthesized": synthesized,
                "switches": switching_events.len(),
            }),
        ));

        Ok(EnsembleRun {
            result: EnsembleResult {
                final_answer,
                selected_models: selected,
                votes,
                contributors,
                synthesized,
                switching_events,
            },
            responses,
        })
    }

    /// Top vote alone, or a synthesis of every leading vote by the top model
    async fn combine(
        &self,
        prompt: &str,
        leading: &[EnsembleVote],
        progress: &dyn ProgressNotifier,
    ) -> (String, Vec<String>, bool) {
        let Some(top) = leading.first() else {
            return (String::new(), Vec::new(), false);
        };
        if leading.len() == 1 {
            return (top.content.clone(), vec![top.model.clone()], false);
        }

        progress.on_phase_start(Phase::Synthesis, 1);
        let total: f64 = leading.iter().map(EnsembleVote::score).sum();
        let answers: Vec<(String, String, f64)> = leading
            .iter()
            .map(|v| {
                let share = if total > f64::EPSILON { v.score() / total } else { 0.0 };
                (v.model.clone(), v.content.clone(), share)
            })
            .collect();
        let synthesis_prompt = PromptTemplate::synthesis(prompt, &answers, &[]);
        let outcome = self
            .router
            .clients()
            .complete(&top.model, &synthesis_prompt)
            .await;
        progress.on_model_complete(Phase::Synthesis, &top.model, outcome.is_success());
        progress.on_phase_complete(Phase::Synthesis);

        match outcome.usable_content() {
            Some(content) => (
                content.to_string(),
                leading.iter().map(|v| v.model.clone()).collect(),
                true,
            ),
            None => {
                warn!("Ensemble synthesis by {} failed; using top vote", top.model);
                (top.content.clone(), vec![top.model.clone()], false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::PerformanceTracker;
    use crate::use_cases::test_support::{ScriptedClient, router_for, router_with, solid};
    use conclave_domain::ModelProfile;

    fn ensemble(client: Arc<ScriptedClient>, models: &[&str]) -> AdaptiveEnsemble {
        AdaptiveEnsemble::new(Arc::new(router_for(client, models)))
    }

    #[tokio::test]
    async fn test_close_votes_are_synthesized() {
        let client = Arc::new(
            ScriptedClient::new()
                .when("a", "Expert answers", "merged answer")
                .answer("a", &solid("Tides are caused by the moon."))
                .answer("b", &solid("The moon's gravity causes tides.")),
        );
        let run = ensemble(client, &["a", "b"]).run("What causes tides?").await.unwrap();
        assert!(run.result.synthesized);
        assert_eq!(run.result.final_answer, "merged answer");
        assert_eq!(run.result.contributors, vec!["a", "b"]);
        assert_eq!(run.result.votes.len(), 2);
    }

    #[tokio::test]
    async fn test_dominant_vote_stands_alone() {
        let client = Arc::new(
            ScriptedClient::new()
                .answer("a", &solid("Tides are caused by the moon."))
                .answer("b", "moon"),
        );
        let run = ensemble(client.clone(), &["a", "b"])
            .run("What causes tides?")
            .await
            .unwrap();
        assert!(!run.result.synthesized);
        assert_eq!(run.result.contributors, vec!["a"]);
        assert!(run.result.final_answer.contains("Tides"));
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_member_is_switched_not_retried() {
        let client = Arc::new(
            ScriptedClient::new()
                .answer("a", &solid("Tides are caused by the moon."))
                .failing("b")
                .answer("c", &solid("The moon.")),
        );
        let engine = ensemble(client.clone(), &["a", "b", "c"])
            .with_config(EnsembleConfig::default().with_bounds(1, 2));
        let run = engine.run("What causes tides?").await.unwrap();

        assert_eq!(run.result.selected_models, vec!["a", "b"]);
        assert_eq!(run.result.switching_events.len(), 1);
        let event = &run.result.switching_events[0];
        assert_eq!(event.failed_model, "b");
        assert_eq!(event.backup_model.as_deref(), Some("c"));
        assert_eq!(client.calls_to("b"), 1);
        assert_eq!(client.calls_to("c"), 0);
    }

    #[tokio::test]
    async fn test_all_failed() {
        let client = Arc::new(ScriptedClient::new().failing("a").failing("b"));
        let err = ensemble(client, &["a", "b"]).run("q").await.unwrap_err();
        assert_eq!(
            err,
            EnsembleError::AllModelsFailed {
                attempted: vec!["a".to_string(), "b".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_min_models_is_enforced() {
        let client = Arc::new(ScriptedClient::new().answer("a", &solid("The moon.")));
        let err = ensemble(client.clone(), &["a"])
            .with_config(EnsembleConfig::default().with_bounds(2, 3))
            .run("What causes tides?")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EnsembleError::TooFewModels {
                available: 1,
                required: 2
            }
        );
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_weights_leading_votes() {
        let client = Arc::new(
            ScriptedClient::new()
                .when("a", "Expert answers", "merged answer")
                .answer("a", &solid("Tides are caused by the moon."))
                .answer("b", &solid("The moon's gravity causes tides.")),
        );
        ensemble(client.clone(), &["a", "b"]).run("What causes tides?").await.unwrap();
        let (_, prompt) = client
            .calls()
            .into_iter()
            .find(|(_, p)| p.contains("Expert answers"))
            .unwrap();
        assert!(prompt.contains("--- a (weight"));
        assert!(prompt.contains("--- b (weight"));
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let err = ensemble(Arc::new(ScriptedClient::new()), &[])
            .run("q")
            .await
            .unwrap_err();
        assert_eq!(err, EnsembleError::NoCandidates);
    }

    #[test]
    fn test_selection_prefers_track_record() {
        let tracker = Arc::new(PerformanceTracker::in_memory());
        for _ in 0..5 {
            tracker.record_usage("veteran", 0, 0.0, 1.0);
            tracker.mark_outcome("veteran", true, Domain::General);
        }
        let profiles = ["novice", "veteran", "rookie"].map(|m| ModelProfile::new(m, "scripted"));
        let engine = AdaptiveEnsemble::new(Arc::new(router_with(
            Arc::new(ScriptedClient::new()),
            profiles,
            tracker,
        )))
        .with_config(EnsembleConfig::default().with_bounds(1, 2));

        let selected = engine.select_models(Domain::General);
        assert_eq!(selected, vec!["veteran", "novice"]);
    }
}
