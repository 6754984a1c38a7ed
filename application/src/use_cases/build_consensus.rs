//! Consensus building use case
//!
//! Reconciles the answers of several models:
//!
//! 1. **Conflict detection**: if every pair of answers agrees, the most
//!    trusted answer is returned at once (score 1.0, no rounds)
//! 2. **Challenge**: for each conflicting pair, each model critiques the
//!    other's answer
//! 3. **Integration**: authors refine their answers from the critiques
//! 4. **Confidence**: each refined answer is weighted by history and by how
//!    cleanly it came through its critiques
//! 5. **Debate** (optional): models score each other's arguments round by
//!    round until agreement, stagnation or `max_rounds`
//! 6. **Synthesis**: answers are merged with each model's share as its
//!    weight. Without debate the share is the confidence from step 4; after
//!    debate it is that confidence times the score the model's final
//!    argument received. After debate the synthesizer sees the final
//!    round's arguments (each already reworked from earlier rounds) and the
//!    key points of every round. If synthesis fails the leading answer is
//!    used verbatim

use crate::config::ConsensusConfig;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::RunEvent;
use crate::use_cases::route_query::ModelRouter;
use conclave_domain::consensus::{self, normalize_weights, refined_confidence, round_consensus};
use conclave_domain::parsing::parse_score;
use conclave_domain::performance::NEUTRAL_PRIOR;
use conclave_domain::{
    CallOutcome, ConsensusResult, Critique, DebateRound, ModelResponse, Phase, PromptTemplate,
};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while building consensus
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsensusError {
    #[error("No responses with content to reconcile")]
    NoResponses,
}

/// Refined answer of one model going into the debate
#[derive(Debug, Clone)]
struct Position {
    answer: String,
    confidence: f64,
}

pub struct ConsensusEngine {
    router: Arc<ModelRouter>,
    config: ConsensusConfig,
}

impl ConsensusEngine {
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self {
            router,
            config: ConsensusConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConsensusConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Execute the use case with default (no-op) progress
    pub async fn build_consensus(
        &self,
        question: &str,
        responses: &[ModelResponse],
    ) -> Result<ConsensusResult, ConsensusError> {
        self.build_consensus_with_progress(question, responses, &NoProgress)
            .await
    }

    pub async fn build_consensus_with_progress(
        &self,
        question: &str,
        responses: &[ModelResponse],
        progress: &dyn ProgressNotifier,
    ) -> Result<ConsensusResult, ConsensusError> {
        let usable: Vec<&ModelResponse> = responses.iter().filter(|r| r.has_content()).collect();
        if usable.is_empty() {
            return Err(ConsensusError::NoResponses);
        }

        let texts: Vec<&str> = usable.iter().map(|r| r.content.as_str()).collect();
        let conflicts = consensus::find_conflicts(&texts, self.config.similarity_threshold);
        if conflicts.is_empty() {
            info!("All {} answers agree; skipping debate", usable.len());
            return Ok(self.aggregate(&usable));
        }

        let conflict_names: Vec<(String, String)> = conflicts
            .iter()
            .map(|&(i, j)| (usable[i].model.clone(), usable[j].model.clone()))
            .collect();
        info!("Found {} conflicting answer pairs", conflict_names.len());

        progress.on_phase_start(Phase::Consensus, conflict_names.len() * 2);
        let critiques = self
            .challenge(question, &usable, &conflict_names, progress)
            .await;
        let positions = self.integrate(question, &usable, &critiques).await;
        progress.on_phase_complete(Phase::Consensus);

        let confidences: BTreeMap<String, f64> = positions
            .iter()
            .map(|(model, p)| (model.clone(), p.confidence))
            .collect();

        if !self.config.enable_debate || self.config.max_rounds == 0 {
            let (leader, best) = most_confident(&positions).ok_or(ConsensusError::NoResponses)?;
            let answers: BTreeMap<String, String> = positions
                .iter()
                .map(|(model, p)| (model.clone(), p.answer.clone()))
                .collect();
            let contributions = normalize_weights(confidences.clone());
            let weighted = weighted_answers(&answers, &contributions);
            let (final_answer, synthesized_by) = self
                .synthesize(question, leader, &weighted, &[], &best.answer, progress)
                .await;
            let score = round_consensus(&confidences.values().copied().collect::<Vec<_>>());
            return Ok(ConsensusResult {
                final_answer,
                rounds: Vec::new(),
                consensus_score: score,
                converged: score >= self.config.consensus_threshold,
                contributions,
                conflicts: conflict_names,
                critiques,
                synthesized_by,
            });
        }

        let arguments: BTreeMap<String, String> = positions
            .into_iter()
            .map(|(model, p)| (model, p.answer))
            .collect();
        let (rounds, converged) = self.debate(question, arguments, progress).await;

        let Some(last) = rounds.last() else {
            return Err(ConsensusError::NoResponses);
        };
        let Some((synthesizer, best_argument, _)) = last.best_argument() else {
            return Err(ConsensusError::NoResponses);
        };

        let contributions = normalize_weights(
            last.arguments
                .keys()
                .map(|model| {
                    let confidence = confidences.get(model).copied().unwrap_or(NEUTRAL_PRIOR);
                    let score = last.average_score(model).unwrap_or(0.0);
                    (model.clone(), confidence * score)
                })
                .collect(),
        );
        let weighted = weighted_answers(&last.arguments, &contributions);
        let key_points = debate_key_points(&rounds);
        let (final_answer, synthesized_by) = self
            .synthesize(question, synthesizer, &weighted, &key_points, best_argument, progress)
            .await;
        let consensus_score = last.consensus_score;

        self.router.logger().log(RunEvent::new(
            "consensus",
            json!({
                "rounds": rounds.len(),
                "score": consensus_score,
                "converged": converged,
                "conflicts": conflict_names.len(),
                "critiques": critiques.len(),
                "synthesized_by": synthesized_by,
            }),
        ));

        Ok(ConsensusResult {
            final_answer,
            rounds,
            consensus_score,
            converged,
            contributions,
            conflicts: conflict_names,
            critiques,
            synthesized_by,
        })
    }

    /// Fast path: weight each agreeing answer by confidence × quality
    fn aggregate(&self, usable: &[&ModelResponse]) -> ConsensusResult {
        let weights: BTreeMap<String, f64> = usable
            .iter()
            .map(|r| (r.model.clone(), r.confidence * r.quality_score))
            .collect();
        let best = usable
            .iter()
            .fold(None::<&&ModelResponse>, |best, r| match best {
                Some(b) if b.confidence * b.quality_score >= r.confidence * r.quality_score => {
                    Some(b)
                }
                _ => Some(r),
            })
            .map(|r| r.content.clone())
            .unwrap_or_default();
        ConsensusResult::unanimous(best, normalize_weights(weights))
    }

    /// Bidirectional critiques for every conflicting pair, concurrently
    async fn challenge(
        &self,
        question: &str,
        usable: &[&ModelResponse],
        conflicts: &[(String, String)],
        progress: &dyn ProgressNotifier,
    ) -> Vec<Critique> {
        let answer_of = |model: &str| {
            usable
                .iter()
                .find(|r| r.model == model)
                .map(|r| r.content.clone())
                .unwrap_or_default()
        };
        let clients = self.router.clients();

        let mut pending: FuturesUnordered<_> = conflicts
            .iter()
            .flat_map(|(a, b)| [(b.clone(), a.clone()), (a.clone(), b.clone())])
            .map(|(critic, target)| {
                let target_answer = answer_of(&target);
                async move {
                    let outcome = clients
                        .critique(&critic, question, &target_answer, &target)
                        .await;
                    (critic, target, outcome)
                }
            })
            .collect();

        let mut critiques = Vec::new();
        while let Some((critic, target, outcome)) = pending.next().await {
            progress.on_model_complete(Phase::Consensus, &critic, outcome.is_success());
            match outcome.usable_content() {
                Some(content) => {
                    debug!("{} critiqued {}", critic, target);
                    critiques.push(Critique::parse(critic, target, content));
                }
                None => warn!("Critique by {} of {} failed", critic, target),
            }
        }
        critiques.sort_by(|a, b| (&a.critic, &a.target).cmp(&(&b.critic, &b.target)));
        critiques
    }

    /// Have each critiqued author refine its answer, then score confidence
    async fn integrate(
        &self,
        question: &str,
        usable: &[&ModelResponse],
        critiques: &[Critique],
    ) -> BTreeMap<String, Position> {
        let clients = self.router.clients();
        let tracker = self.router.tracker();

        let refinements = usable.iter().map(|response| {
            let received: Vec<&Critique> = critiques
                .iter()
                .filter(|c| c.target == response.model)
                .collect();
            async move {
                let answer = if received.is_empty() {
                    response.content.clone()
                } else {
                    let texts: Vec<String> = received.iter().map(|c| c.content.clone()).collect();
                    let outcome = clients
                        .improve(&response.model, question, &response.content, &texts)
                        .await;
                    match outcome.usable_content() {
                        Some(refined) => refined.to_string(),
                        None => {
                            warn!("{} could not refine its answer; keeping it", response.model);
                            response.content.clone()
                        }
                    }
                };
                let history = tracker
                    .get(&response.model)
                    .map(|h| h.avg_quality())
                    .unwrap_or(NEUTRAL_PRIOR);
                let prior = 0.5 * response.confidence + 0.5 * history;
                let confidence = refined_confidence(prior, &received);
                (
                    response.model.clone(),
                    Position { answer, confidence },
                )
            }
        });

        futures::future::join_all(refinements)
            .await
            .into_iter()
            .collect()
    }

    /// Debate rounds; returns the rounds and whether the threshold was hit
    async fn debate(
        &self,
        question: &str,
        mut arguments: BTreeMap<String, String>,
        progress: &dyn ProgressNotifier,
    ) -> (Vec<DebateRound>, bool) {
        let mut rounds: Vec<DebateRound> = Vec::new();
        let mut converged = false;

        for number in 1..=self.config.max_rounds {
            let evaluations = self.evaluate(question, &arguments).await;
            let round = DebateRound::new(number, arguments.clone(), evaluations);
            let score = round.consensus_score;
            info!("Debate round {}: consensus {:.2}", number, score);
            progress.on_round_complete(Phase::Consensus, number, score);
            self.router.logger().log(RunEvent::new(
                "consensus_round",
                json!({ "round": number, "score": score, "key_points": round.key_points.len() }),
            ));

            let previous = rounds.last().map(|r| r.consensus_score);
            let has_next = number < self.config.max_rounds;
            rounds.push(round);

            if score >= self.config.consensus_threshold {
                converged = true;
                break;
            }
            if let Some(previous) = previous
                && score - previous < self.config.min_improvement
            {
                debug!("Debate stalled ({:.2} -> {:.2})", previous, score);
                break;
            }
            if has_next && let Some(last) = rounds.last() {
                arguments = self.regenerate_weak(question, last).await;
            }
        }
        (rounds, converged)
    }

    /// Every model scores every other model's argument, never its own
    async fn evaluate(
        &self,
        question: &str,
        arguments: &BTreeMap<String, String>,
    ) -> BTreeMap<String, BTreeMap<String, f64>> {
        let clients = self.router.clients();
        let scorer = self.router.scorer();

        let mut pending: FuturesUnordered<_> = arguments
            .keys()
            .flat_map(|evaluator| {
                arguments
                    .iter()
                    .filter(move |(target, _)| *target != evaluator)
                    .map(move |(target, argument)| (evaluator, target, argument))
            })
            .map(|(evaluator, target, argument)| async move {
                let prompt = PromptTemplate::evaluate(question, argument);
                let outcome = clients.complete(evaluator, &prompt).await;
                (evaluator, target, argument, outcome)
            })
            .collect();

        let mut evaluations: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        while let Some((evaluator, target, argument, outcome)) = pending.next().await {
            let Some(reply) = outcome.usable_content() else {
                warn!("{} failed to evaluate {}", evaluator, target);
                continue;
            };
            let score = parse_score(reply).unwrap_or_else(|| scorer.assess(argument, None).score);
            evaluations
                .entry(evaluator.clone())
                .or_default()
                .insert(target.clone(), score);
        }
        evaluations
    }

    /// Rework arguments averaging below `regenerate_below`; others carry over
    async fn regenerate_weak(&self, question: &str, round: &DebateRound) -> BTreeMap<String, String> {
        let clients = self.router.clients();
        let threshold = self.config.regenerate_below;

        let updates = round.arguments.iter().map(|(model, argument)| async move {
            let weak = round
                .average_score(model)
                .is_some_and(|score| score < threshold);
            if !weak {
                return (model.clone(), argument.clone());
            }
            let prompt = PromptTemplate::regenerate(question, argument, &round.key_points);
            match clients.complete(model, &prompt).await {
                CallOutcome::Success(c) if !c.content.trim().is_empty() => {
                    debug!("{} regenerated its argument", model);
                    (model.clone(), c.content)
                }
                _ => (model.clone(), argument.clone()),
            }
        });

        futures::future::join_all(updates)
            .await
            .into_iter()
            .collect()
    }

    /// Merge `answers` (heaviest first) through `synthesizer`; `fallback`
    /// stands in verbatim when the call yields nothing.
    async fn synthesize(
        &self,
        question: &str,
        synthesizer: &str,
        answers: &[(String, String, f64)],
        key_points: &[String],
        fallback: &str,
        progress: &dyn ProgressNotifier,
    ) -> (String, Option<String>) {
        progress.on_phase_start(Phase::Synthesis, 1);
        let prompt = PromptTemplate::synthesis(question, answers, key_points);
        let outcome = self.router.clients().complete(synthesizer, &prompt).await;
        progress.on_model_complete(Phase::Synthesis, synthesizer, outcome.is_success());
        progress.on_phase_complete(Phase::Synthesis);

        match outcome.usable_content() {
            Some(content) => (content.to_string(), Some(synthesizer.to_string())),
            None => {
                warn!(
                    "Synthesis by {} failed; using its answer verbatim",
                    synthesizer
                );
                (fallback.to_string(), None)
            }
        }
    }
}

/// `(model, answer, share)` ordered by share, largest first
fn weighted_answers(
    answers: &BTreeMap<String, String>,
    shares: &BTreeMap<String, f64>,
) -> Vec<(String, String, f64)> {
    let mut weighted: Vec<(String, String, f64)> = answers
        .iter()
        .map(|(model, answer)| {
            let share = shares.get(model).copied().unwrap_or(0.0);
            (model.clone(), answer.clone(), share)
        })
        .collect();
    weighted.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    weighted
}

/// Key points from every round, first mention first
fn debate_key_points(rounds: &[DebateRound]) -> Vec<String> {
    let mut points: Vec<String> = Vec::new();
    for point in rounds.iter().flat_map(|r| r.key_points.iter()) {
        if !points.contains(point) {
            points.push(point.clone());
        }
    }
    points
}

/// Highest confidence; ties go to the model name sorting first
fn most_confident(positions: &BTreeMap<String, Position>) -> Option<(&String, &Position)> {
    positions.iter().fold(None, |best, candidate| match best {
        Some(b) if b.1.confidence >= candidate.1.confidence => Some(b),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{ScriptedClient, router_for};
    use conclave_domain::{HeuristicQualityScorer, QualityAssessment, QualityScorer};

    fn response(model: &str, content: &str) -> ModelResponse {
        let assessment = HeuristicQualityScorer::new().assess(content, None);
        ModelResponse::from_outcome(model, CallOutcome::success(content), assessment, 0.0, 10)
    }

    fn australia() -> Vec<ModelResponse> {
        vec![
            response("a", "The capital of Australia is Sydney."),
            response("b", "Australia's capital is Canberra."),
        ]
    }

    fn debating_client(score: &str) -> ScriptedClient {
        ScriptedClient::new()
            .when("a", "Expert answers", "Canberra is the capital of Australia.")
            .when("b", "Expert answers", "Canberra is the capital of Australia.")
            .when("a", "reviewing", "Looks right to me. Confidence: 8/10")
            .when("b", "reviewing", "- Sydney is wrong, the capital is Canberra.\nConfidence: 9/10")
            .when("a", "Other experts", "You are right: the capital of Australia is Canberra.")
            .when("b", "Other experts", "The capital of Australia is Canberra.")
            .when("a", "Evaluate this answer", score)
            .when("b", "Evaluate this answer", score)
    }

    #[tokio::test]
    async fn test_paraphrases_skip_debate() {
        let client = Arc::new(ScriptedClient::new());
        let engine = ConsensusEngine::new(Arc::new(router_for(client.clone(), &["a", "b", "c"])));
        let responses = vec![
            response("a", "Paris is the capital of France."),
            response("b", "The capital of France is Paris."),
            response("c", "France's capital city is Paris."),
        ];

        let result = engine.build_consensus("Capital of France?", &responses).await.unwrap();
        assert_eq!(result.rounds_completed(), 0);
        assert_eq!(result.consensus_score, 1.0);
        assert!(result.converged);
        assert!(result.final_answer.contains("Paris"));
        assert!(client.calls().is_empty());
        let total: f64 = result.contributions.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_conflict_triggers_bidirectional_critique() {
        let client = Arc::new(debating_client(r#"{"score": 9}"#));
        let engine = ConsensusEngine::new(Arc::new(router_for(client, &["a", "b"])));

        let result = engine
            .build_consensus("What is the capital of Australia?", &australia())
            .await
            .unwrap();

        assert_eq!(result.conflicts, vec![("a".to_string(), "b".to_string())]);
        let pairs: Vec<(&str, &str)> = result
            .critiques
            .iter()
            .map(|c| (c.critic.as_str(), c.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("b", "a")]);
        assert_eq!(result.critiques[1].errors.len(), 1);
    }

    #[tokio::test]
    async fn test_debate_stops_at_threshold_and_synthesizes() {
        let client = Arc::new(debating_client(r#"{"score": 9}"#));
        let engine = ConsensusEngine::new(Arc::new(router_for(client, &["a", "b"])));

        let result = engine
            .build_consensus("What is the capital of Australia?", &australia())
            .await
            .unwrap();

        assert_eq!(result.rounds_completed(), 1);
        assert!(result.converged);
        assert!((result.consensus_score - 0.9).abs() < 1e-9);
        assert_eq!(result.synthesized_by.as_deref(), Some("a"));
        assert_eq!(result.final_answer, "Canberra is the capital of Australia.");
    }

    #[tokio::test]
    async fn test_rounds_never_exceed_max() {
        for max_rounds in [1, 2, 3] {
            let client = Arc::new(debating_client("3/10"));
            let engine = ConsensusEngine::new(Arc::new(router_for(client, &["a", "b"])))
                .with_config(
                    ConsensusConfig::default()
                        .with_max_rounds(max_rounds)
                        .with_min_improvement(0.0),
                );
            let result = engine.build_consensus("capital?", &australia()).await.unwrap();
            assert!(result.rounds_completed() <= max_rounds);
            assert!(!result.converged);
        }
    }

    #[tokio::test]
    async fn test_stagnation_stops_debate() {
        let client = Arc::new(debating_client("3/10"));
        let engine = ConsensusEngine::new(Arc::new(router_for(client, &["a", "b"])));
        let result = engine.build_consensus("capital?", &australia()).await.unwrap();
        // identical scores every round: no improvement after round 1
        assert_eq!(result.rounds_completed(), 2);
    }

    #[tokio::test]
    async fn test_failed_synthesis_falls_back_to_best_argument() {
        let client = Arc::new(
            ScriptedClient::new()
                .when("a", "reviewing", "Fine. Confidence: 5/10")
                .when("b", "reviewing", "Fine. Confidence: 5/10")
                .when("a", "Evaluate this answer", r#"{"score": 6}"#)
                .when("b", "Evaluate this answer", r#"{"score": 9}"#),
        );
        let engine = ConsensusEngine::new(Arc::new(router_for(client, &["a", "b"])))
            .with_config(ConsensusConfig::default().with_max_rounds(1));

        let result = engine.build_consensus("capital?", &australia()).await.unwrap();
        assert!(result.synthesized_by.is_none());
        // b scored a's argument 0.9, a scored b's 0.6; the improve call failed so
        // a kept its original answer
        assert_eq!(result.final_answer, "The capital of Australia is Sydney.");
        assert!(result.contributions["a"] > result.contributions["b"]);
    }

    #[tokio::test]
    async fn test_without_debate_most_confident_synthesizes() {
        let client = Arc::new(debating_client("5/10"));
        let engine = ConsensusEngine::new(Arc::new(router_for(client, &["a", "b"])))
            .with_config(ConsensusConfig::default().without_debate());

        let result = engine.build_consensus("capital?", &australia()).await.unwrap();
        assert_eq!(result.rounds_completed(), 0);
        assert!(result.final_answer.contains("Canberra"));
        assert!(!result.critiques.is_empty());
        // a's answer drew an error, so b is more confident
        assert_eq!(result.synthesized_by.as_deref(), Some("b"));
        assert!(result.contributions["b"] > result.contributions["a"]);
    }

    fn confident(model: &str, content: &str, confidence: f64) -> ModelResponse {
        let mut r = response(model, content);
        r.confidence = confidence;
        r
    }

    fn neutral_critics() -> ScriptedClient {
        ScriptedClient::new()
            .when("a", "reviewing", "Fine. Confidence: 5/10")
            .when("b", "reviewing", "Fine. Confidence: 5/10")
            .when("a", "Expert answers", "merged")
            .when("b", "Expert answers", "merged")
    }

    /// Position of `model`'s entry in the synthesis prompt sent to the client
    fn synthesis_rank(client: &ScriptedClient, model: &str) -> usize {
        client
            .calls()
            .iter()
            .find(|(_, prompt)| prompt.contains("Expert answers"))
            .and_then(|(_, prompt)| prompt.find(&format!("--- {model} (weight")))
            .unwrap()
    }

    #[tokio::test]
    async fn test_confidence_orders_and_weights_synthesis() {
        for (conf_a, conf_b, leader) in [(0.9, 0.2, "a"), (0.2, 0.9, "b")] {
            let client = Arc::new(neutral_critics());
            let engine = ConsensusEngine::new(Arc::new(router_for(client.clone(), &["a", "b"])))
                .with_config(ConsensusConfig::default().without_debate());
            let responses = vec![
                confident("a", "The capital of Australia is Sydney.", conf_a),
                confident("b", "Australia's capital is Canberra.", conf_b),
            ];

            let result = engine.build_consensus("capital?", &responses).await.unwrap();
            let other = if leader == "a" { "b" } else { "a" };
            assert_eq!(result.final_answer, "merged");
            assert_eq!(result.synthesized_by.as_deref(), Some(leader));
            assert!(result.contributions[leader] > result.contributions[other]);
            assert!(synthesis_rank(&client, leader) < synthesis_rank(&client, other));
        }
    }

    #[test]
    fn test_key_points_span_every_round() {
        let mut first = DebateRound::new(1, BTreeMap::new(), BTreeMap::new());
        first.key_points = vec!["canberra is the capital".to_string()];
        let mut second = DebateRound::new(2, BTreeMap::new(), BTreeMap::new());
        second.key_points = vec![
            "canberra is the capital".to_string(),
            "sydney is the largest city".to_string(),
        ];
        assert_eq!(
            debate_key_points(&[first, second]),
            vec!["canberra is the capital", "sydney is the largest city"]
        );
    }

    #[tokio::test]
    async fn test_debate_contributions_follow_confidence() {
        // equal evaluation scores, so confidence decides the shares
        let client = Arc::new(
            neutral_critics()
                .when("a", "Evaluate this answer", "9/10")
                .when("b", "Evaluate this answer", "9/10"),
        );
        let engine = ConsensusEngine::new(Arc::new(router_for(client.clone(), &["a", "b"])));
        let responses = vec![
            confident("a", "The capital of Australia is Sydney.", 0.2),
            confident("b", "Australia's capital is Canberra.", 0.9),
        ];

        let result = engine.build_consensus("capital?", &responses).await.unwrap();
        assert_eq!(result.rounds_completed(), 1);
        assert!(result.contributions["b"] > result.contributions["a"]);
        assert!(synthesis_rank(&client, "b") < synthesis_rank(&client, "a"));
    }

    #[tokio::test]
    async fn test_no_content_is_an_error() {
        let engine = ConsensusEngine::new(Arc::new(router_for(
            Arc::new(ScriptedClient::new()),
            &["a"],
        )));
        let empty = ModelResponse::from_outcome(
            "a",
            CallOutcome::failure("down"),
            QualityAssessment::ZERO,
            0.5,
            0,
        );
        assert_eq!(
            engine.build_consensus("q", &[empty]).await.unwrap_err(),
            ConsensusError::NoResponses
        );
    }
}
