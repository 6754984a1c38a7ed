//! Consensus value objects and scoring
//!
//! The consensus engine itself lives in the application layer; this module
//! holds what it produces and the pure math it relies on:
//!
//! - [`similarity`] and [`find_conflicts`] decide whether answers disagree
//! - [`round_consensus`] turns one round's evaluation scores into a single
//!   agreement score (mean penalized by spread)
//! - [`Critique`], [`DebateRound`] and [`ConsensusResult`] record the run

use crate::core::text;
use crate::parsing;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_KEY_POINTS: usize = 5;
const MIN_KEY_POINT_WORDS: usize = 4;

/// Textual agreement of two answers in `0.0..=1.0`.
///
/// Averages content-word overlap with overlap of named entities and
/// numbers. When either side names no entities only the content words
/// count.
pub fn similarity(a: &str, b: &str) -> f64 {
    let content = text::jaccard(&text::content_words(a), &text::content_words(b));
    let (ea, eb) = (text::entities(a), text::entities(b));
    if ea.is_empty() || eb.is_empty() {
        return content;
    }
    0.5 * content + 0.5 * text::jaccard(&ea, &eb)
}

/// Index pairs `(i, j)`, `i < j`, whose similarity falls below `threshold`
pub fn find_conflicts(answers: &[&str], threshold: f64) -> Vec<(usize, usize)> {
    let mut conflicts = Vec::new();
    for i in 0..answers.len() {
        for j in (i + 1)..answers.len() {
            if similarity(answers[i], answers[j]) < threshold {
                conflicts.push((i, j));
            }
        }
    }
    conflicts
}

/// Mean score penalized by its standard deviation, clamped to `0.0..=1.0`.
///
/// No scores means no agreement.
pub fn round_consensus(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    (mean * (1.0 - variance.sqrt())).clamp(0.0, 1.0)
}

/// Sentences whose content words are shared by at least two arguments
pub fn extract_key_points<'a>(arguments: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let arguments: Vec<&str> = arguments.into_iter().collect();
    let word_sets: Vec<_> = arguments.iter().map(|a| text::content_words(a)).collect();

    let mut points: Vec<String> = Vec::new();
    for (i, argument) in arguments.iter().enumerate() {
        for sentence in argument.split_inclusive(['.', '!', '?', '\n']) {
            let sentence = sentence.trim();
            if text::word_count(sentence) < MIN_KEY_POINT_WORDS {
                continue;
            }
            let words = text::content_words(sentence);
            let shared = word_sets
                .iter()
                .enumerate()
                .filter(|(j, set)| *j != i && words.iter().filter(|w| set.contains(*w)).count() >= 2)
                .count();
            if shared > 0 && !points.iter().any(|p| similarity(p, sentence) > 0.8) {
                points.push(sentence.to_string());
                if points.len() == MAX_KEY_POINTS {
                    return points;
                }
            }
        }
    }
    points
}

/// One model's critique of another model's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub critic: String,
    pub target: String,
    pub content: String,
    /// Critic's confidence in its own critique
    pub confidence: f64,
    pub errors: Vec<String>,
    pub gaps: Vec<String>,
}

impl Critique {
    /// Build a critique from raw text, extracting findings and any stated
    /// confidence score (neutral when absent).
    pub fn parse(critic: impl Into<String>, target: impl Into<String>, content: &str) -> Self {
        let (errors, gaps) = parsing::parse_findings(content);
        Self {
            critic: critic.into(),
            target: target.into(),
            content: content.to_string(),
            confidence: parsing::parse_score(content).unwrap_or(0.5),
            errors,
            gaps,
        }
    }

    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.gaps.len()
    }
}

/// Confidence for a refined answer: 60% prior, 40% how cleanly it came
/// through its critiques.
pub fn refined_confidence(prior: f64, critiques: &[&Critique]) -> f64 {
    let issues: usize = critiques.iter().map(|c| c.issue_count()).sum();
    let outcome = 1.0 - (issues as f64 * 0.15).min(1.0);
    (0.6 * prior + 0.4 * outcome).clamp(0.0, 1.0)
}

/// One debate round: current arguments and who scored whom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
    pub round: usize,
    /// model -> argument
    pub arguments: BTreeMap<String, String>,
    /// evaluator -> (target -> score)
    pub evaluations: BTreeMap<String, BTreeMap<String, f64>>,
    pub consensus_score: f64,
    pub key_points: Vec<String>,
}

impl DebateRound {
    /// Round with scores filled in: consensus over every evaluation,
    /// key points from the arguments.
    pub fn new(
        round: usize,
        arguments: BTreeMap<String, String>,
        evaluations: BTreeMap<String, BTreeMap<String, f64>>,
    ) -> Self {
        let scores: Vec<f64> = evaluations.values().flat_map(|m| m.values().copied()).collect();
        let key_points = extract_key_points(arguments.values().map(String::as_str));
        Self {
            round,
            arguments,
            evaluations,
            consensus_score: round_consensus(&scores),
            key_points,
        }
    }

    /// Mean score `model` received from the other evaluators
    pub fn average_score(&self, model: &str) -> Option<f64> {
        let received: Vec<f64> = self
            .evaluations
            .iter()
            .filter(|(evaluator, _)| evaluator.as_str() != model)
            .filter_map(|(_, targets)| targets.get(model).copied())
            .collect();
        if received.is_empty() {
            return None;
        }
        Some(received.iter().sum::<f64>() / received.len() as f64)
    }

    /// Highest-scored argument; ties go to the model name sorting first.
    pub fn best_argument(&self) -> Option<(&str, &str, f64)> {
        self.arguments
            .iter()
            .map(|(model, arg)| (model.as_str(), arg.as_str(), self.average_score(model).unwrap_or(0.0)))
            .fold(None, |best, candidate| match best {
                Some(b) if b.2 >= candidate.2 => Some(b),
                _ => Some(candidate),
            })
    }
}

/// Outcome of a consensus run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub final_answer: String,
    pub rounds: Vec<DebateRound>,
    pub consensus_score: f64,
    pub converged: bool,
    /// model -> share of the final answer
    pub contributions: BTreeMap<String, f64>,
    /// Conflicting answer pairs found before debating
    pub conflicts: Vec<(String, String)>,
    pub critiques: Vec<Critique>,
    /// Model that wrote the final synthesis, if synthesis succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesized_by: Option<String>,
}

impl ConsensusResult {
    /// Fast path: everyone already agrees
    pub fn unanimous(final_answer: String, contributions: BTreeMap<String, f64>) -> Self {
        Self {
            final_answer,
            rounds: Vec::new(),
            consensus_score: 1.0,
            converged: true,
            contributions,
            conflicts: Vec::new(),
            critiques: Vec::new(),
            synthesized_by: None,
        }
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds.len()
    }
}

/// Normalize non-negative weights to shares summing to 1.
///
/// All-zero weights split evenly.
pub fn normalize_weights(weights: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = weights.values().map(|w| w.max(0.0)).sum();
    let n = weights.len() as f64;
    weights
        .into_iter()
        .map(|(model, w)| {
            let share = if total > f64::EPSILON { w.max(0.0) / total } else { 1.0 / n };
            (model, share)
        })
        .collect()
}
