//! Call outcomes and response quality
//!
//! Every provider call ends in a [`CallOutcome`]: either a [`Completion`] or
//! an in-band failure reason. The router turns outcomes into scored
//! [`ModelResponse`]s; a failed call and a low-quality answer look the same
//! from there on.

use crate::core::text;
use crate::performance::{ModelPerformance, NEUTRAL_PRIOR};
use serde::{Deserialize, Serialize};

/// Raw result of one successful model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tokens: None,
            cost: None,
        }
    }

    pub fn with_usage(mut self, tokens: u64, cost: f64) -> Self {
        self.tokens = Some(tokens);
        self.cost = Some(cost);
        self
    }
}

/// Success or failure of one model call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(Completion),
    Failure(String),
}

impl CallOutcome {
    pub fn success(content: impl Into<String>) -> Self {
        CallOutcome::Success(Completion::new(content))
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        CallOutcome::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// Content of a successful call
    pub fn content(&self) -> Option<&str> {
        match self {
            CallOutcome::Success(c) => Some(&c.content),
            CallOutcome::Failure(_) => None,
        }
    }

    /// Successful, non-blank content
    pub fn usable_content(&self) -> Option<&str> {
        self.content().filter(|c| !c.trim().is_empty())
    }
}

/// Heuristic judgement of one response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Quality in `0.0..=1.0`
    pub score: f64,
    /// How sure the response sounds, `0.0..=1.0`
    pub confidence: f64,
}

impl QualityAssessment {
    pub const ZERO: Self = Self {
        score: 0.0,
        confidence: 0.0,
    };
}

/// Scored answer from one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: String,
    pub content: String,
    pub quality_score: f64,
    pub confidence: f64,
    /// Whether the response cleared the quality gate
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub latency_ms: u64,
}

impl ModelResponse {
    /// Score a finished call against `min_quality`.
    ///
    /// Failures get zero quality and carry their reason.
    pub fn from_outcome(
        model: impl Into<String>,
        outcome: CallOutcome,
        assessment: QualityAssessment,
        min_quality: f64,
        latency_ms: u64,
    ) -> Self {
        let model = model.into();
        match outcome {
            CallOutcome::Success(completion) => {
                let passed = assessment.score >= min_quality;
                Self {
                    model,
                    content: completion.content,
                    quality_score: assessment.score,
                    confidence: assessment.confidence,
                    passed,
                    failure_reason: (!passed).then(|| {
                        format!(
                            "quality {:.2} below minimum {:.2}",
                            assessment.score, min_quality
                        )
                    }),
                    tokens: completion.tokens,
                    cost: completion.cost,
                    latency_ms,
                }
            }
            CallOutcome::Failure(reason) => {
                Self::failure(model, reason).with_latency(latency_ms)
            }
        }
    }

    pub fn failure(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: String::new(),
            quality_score: 0.0,
            confidence: 0.0,
            passed: false,
            failure_reason: Some(reason.into()),
            tokens: None,
            cost: None,
            latency_ms: 0,
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Pluggable response scoring
pub trait QualityScorer: Send + Sync {
    /// Score `content`, optionally informed by the model's history
    fn assess(&self, content: &str, history: Option<&ModelPerformance>) -> QualityAssessment;
}

const ERROR_PHRASES: &[&str] = &[
    "i cannot",
    "i can't",
    "i'm sorry",
    "i am sorry",
    "as an ai",
    "unable to",
    "i don't know",
    "i do not know",
    "error:",
];

const REASONING_INDICATORS: &[&str] = &[
    "because",
    "therefore",
    "thus",
    "since",
    "for example",
    "for instance",
    "evidence",
    "specifically",
    "consequently",
    "as a result",
];

const HEDGES: &[&str] = &[
    "maybe",
    "perhaps",
    "possibly",
    "might",
    "not sure",
    "i think",
    "unclear",
];

const SHORT_WORDS: usize = 5;
const LONG_WORDS: usize = 2_000;

/// Length band, error-phrase penalty and history bonus
#[derive(Debug, Clone, Default)]
pub struct HeuristicQualityScorer;

impl HeuristicQualityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Quality alone, without history
    pub fn score(&self, content: &str) -> f64 {
        if content.trim().is_empty() {
            return 0.0;
        }
        let words = text::word_count(content);
        let base = if words < SHORT_WORDS {
            0.2
        } else if words <= LONG_WORDS {
            0.7
        } else {
            0.5
        };
        let errors = text::count_phrases(&content.to_lowercase(), ERROR_PHRASES);
        (base - 0.3 * errors as f64).clamp(0.0, 1.0)
    }

    /// Reasoning indicators raise confidence, hedges lower it
    pub fn confidence(&self, content: &str) -> f64 {
        if content.trim().is_empty() {
            return 0.0;
        }
        let lowered = content.to_lowercase();
        let reasoning = text::count_phrases(&lowered, REASONING_INDICATORS) as f64;
        let hedges = text::count_phrases(&lowered, HEDGES) as f64;
        (0.5 + 0.1 * reasoning).min(0.95) - 0.05 * hedges
    }
}

impl QualityScorer for HeuristicQualityScorer {
    fn assess(&self, content: &str, history: Option<&ModelPerformance>) -> QualityAssessment {
        if content.trim().is_empty() {
            return QualityAssessment::ZERO;
        }
        let bonus = history
            .map(|h| (h.avg_quality() - NEUTRAL_PRIOR) * 0.2)
            .unwrap_or(0.0);
        QualityAssessment {
            score: (self.score(content) + bonus).clamp(0.0, 1.0),
            confidence: self.confidence(content).clamp(0.1, 0.95),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_scores_zero() {
        let scorer = HeuristicQualityScorer::new();
        let mut history = ModelPerformance::new("m");
        history.record_usage(10, 0.0, 1.0);
        assert_eq!(scorer.assess("", Some(&history)), QualityAssessment::ZERO);
        assert_eq!(scorer.assess("   \n", None).score, 0.0);
    }

    #[test]
    fn test_length_band() {
        let scorer = HeuristicQualityScorer::new();
        assert_eq!(scorer.score("Paris."), 0.2);
        assert_eq!(scorer.score("Paris is the capital of France."), 0.7);
        let long = "word ".repeat(2_500);
        assert_eq!(scorer.score(&long), 0.5);
    }

    #[test]
    fn test_error_phrase_penalty() {
        let scorer = HeuristicQualityScorer::new();
        let score = scorer.score("I'm sorry, I cannot help with that request today.");
        assert!(score < 0.2, "score was {score}");
    }

    #[test]
    fn test_history_bonus() {
        let scorer = HeuristicQualityScorer::new();
        let mut good = ModelPerformance::new("good");
        good.record_usage(0, 0.0, 1.0);
        let plain = scorer.assess("Paris is the capital of France.", None).score;
        let boosted = scorer.assess("Paris is the capital of France.", Some(&good)).score;
        assert!((boosted - plain - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_indicators() {
        let scorer = HeuristicQualityScorer::new();
        let reasoned = scorer.confidence("It works because of X; therefore Y, for example Z.");
        let hedged = scorer.confidence("Maybe it works, perhaps not.");
        assert!(reasoned > 0.7);
        assert!(hedged < 0.5);
    }

    #[test]
    fn test_response_from_outcome() {
        let passed = ModelResponse::from_outcome(
            "m",
            CallOutcome::success("fine answer"),
            QualityAssessment {
                score: 0.7,
                confidence: 0.5,
            },
            0.5,
            12,
        );
        assert!(passed.passed);
        assert!(passed.failure_reason.is_none());

        let failed = ModelResponse::from_outcome(
            "m",
            CallOutcome::failure("timeout"),
            QualityAssessment::ZERO,
            0.5,
            30,
        );
        assert!(!failed.passed);
        assert_eq!(failed.quality_score, 0.0);
        assert_eq!(failed.failure_reason.as_deref(), Some("timeout"));
        assert_eq!(failed.latency_ms, 30);
    }

    #[test]
    fn test_usable_content() {
        assert_eq!(CallOutcome::success("x").usable_content(), Some("x"));
        assert_eq!(CallOutcome::success("  ").usable_content(), None);
        assert_eq!(CallOutcome::failure("boom").usable_content(), None);
    }
}
