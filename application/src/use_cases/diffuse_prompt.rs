//! Prompt diffusion use case
//!
//! Before anyone answers, participating models rewrite the prompt under
//! rotating refinement roles and judge each other's rewrites. The best
//! rewrite of each round becomes the next round's input; the best version
//! seen in any round is returned.

use crate::config::DiffusionConfig;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::RunEvent;
use crate::use_cases::route_query::ModelRouter;
use conclave_domain::diffusion::{convergence, heuristic_rewrite_score};
use conclave_domain::parsing::parse_score;
use conclave_domain::{
    Capability, DiffusionResult, Phase, PromptTemplate, PromptVersion, RefinementRole,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffusionError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("No models available to rewrite the prompt")]
    NoParticipants,
}

pub struct PromptDiffusion {
    router: Arc<ModelRouter>,
    config: DiffusionConfig,
}

impl PromptDiffusion {
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self {
            router,
            config: DiffusionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DiffusionConfig) -> Self {
        self.config = config;
        self
    }

    /// Reasoning-capable available models, best first
    fn participants(&self) -> Vec<String> {
        let clients = self.router.clients();
        self.router
            .registry()
            .rank_for_capabilities(&[Capability::Reasoning])
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| clients.contains(name))
            .take(self.config.participants)
            .collect()
    }

    /// Execute the use case with default (no-op) progress
    pub async fn diffuse(&self, prompt: &str) -> Result<DiffusionResult, DiffusionError> {
        self.diffuse_with_progress(prompt, &NoProgress).await
    }

    pub async fn diffuse_with_progress(
        &self,
        prompt: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<DiffusionResult, DiffusionError> {
        if prompt.trim().is_empty() {
            return Err(DiffusionError::EmptyPrompt);
        }
        let participants = self.participants();
        if participants.is_empty() {
            return Err(DiffusionError::NoParticipants);
        }

        let original = PromptVersion::original(prompt);
        let mut versions = vec![original.clone()];
        let mut current = original.clone();
        let mut best = original;
        let mut rounds_completed = 0;
        let mut converged = false;
        let mut final_convergence = 0.0;

        for round in 1..=self.config.max_rounds {
            progress.on_phase_start(Phase::Diffusion, participants.len());
            let rewrites = self
                .rewrite_round(&participants, &current, round, versions.len(), progress)
                .await;
            progress.on_phase_complete(Phase::Diffusion);

            let Some(round_best) = rewrites
                .iter()
                .fold(None::<&PromptVersion>, |acc, v| match acc {
                    Some(b) if b.score >= v.score => Some(b),
                    _ => Some(v),
                })
                .cloned()
            else {
                warn!("Diffusion round {} produced no rewrites; stopping", round);
                break;
            };

            final_convergence = convergence(&current, &round_best);
            rounds_completed = round;
            versions.extend(rewrites);
            info!(
                "Diffusion round {}: best v{} by {} ({:.2}), convergence {:.2}",
                round, round_best.version, round_best.author, round_best.score, final_convergence
            );
            progress.on_round_complete(Phase::Diffusion, round, final_convergence);
            self.router.logger().log(RunEvent::new(
                "diffusion_round",
                json!({
                    "round": round,
                    "best_version": round_best.version,
                    "score": round_best.score,
                    "convergence": final_convergence,
                }),
            ));

            if round_best.score > best.score {
                best = round_best.clone();
            }
            current = round_best;

            if final_convergence >= self.config.convergence_threshold {
                converged = true;
                break;
            }
        }

        Ok(DiffusionResult {
            best,
            versions,
            rounds_completed,
            converged,
            final_convergence,
        })
    }

    /// Rewrite `current` once per participant, then have the next
    /// participant judge each rewrite
    async fn rewrite_round(
        &self,
        participants: &[String],
        current: &PromptVersion,
        round: usize,
        first_version: usize,
        progress: &dyn ProgressNotifier,
    ) -> Vec<PromptVersion> {
        let clients = self.router.clients();

        let calls = participants.iter().enumerate().map(|(i, model)| async move {
            let role = RefinementRole::for_participant(i, round);
            let outcome = clients
                .complete(model, &PromptTemplate::rewrite(&current.text, role))
                .await;
            (i, model, role, outcome)
        });
        let outcomes = futures::future::join_all(calls).await;

        let mut drafts = Vec::new();
        for (i, model, role, outcome) in outcomes {
            progress.on_model_complete(Phase::Diffusion, model, outcome.is_success());
            match outcome.usable_content() {
                Some(text) => {
                    let version = PromptVersion::rewrite(
                        first_version + drafts.len(),
                        current,
                        text.trim(),
                        model.as_str(),
                        round,
                        role,
                    );
                    drafts.push((i, version));
                }
                None => warn!("{} failed to rewrite the prompt", model),
            }
        }

        let judged = drafts.into_iter().map(|(i, version)| async move {
            let judge = &participants[(i + 1) % participants.len()];
            let outcome = clients
                .complete(judge, &PromptTemplate::judge(&current.text, &version.text))
                .await;
            let score = match outcome.usable_content().and_then(parse_score) {
                Some(score) => score,
                None => {
                    debug!("Judge {} gave no score for v{}; using heuristic", judge, version.version);
                    heuristic_rewrite_score(&current.text, &version.text)
                }
            };
            version.with_score(score)
        });
        futures::future::join_all(judged).await
    }
}
