//! Per-model outcome statistics.
//!
//! [`ModelPerformance`] counters only ever grow; the quality and latency
//! windows are bounded and drop their oldest entries first.

use crate::routing::Domain;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Maximum number of quality scores retained per model
pub const QUALITY_WINDOW: usize = 100;
/// Maximum number of latency samples retained per model
pub const LATENCY_WINDOW: usize = 100;
/// Neutral prior used when a model has no recorded history
pub const NEUTRAL_PRIOR: f64 = 0.5;

/// Success/failure counters for one domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStats {
    pub successes: u64,
    pub failures: u64,
}

impl DomainStats {
    pub fn samples(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn success_rate(&self) -> Option<f64> {
        let samples = self.samples();
        (samples > 0).then(|| self.successes as f64 / samples as f64)
    }
}

/// Mutable outcome ledger for a single model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPerformance {
    pub model: String,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub quality_scores: VecDeque<f64>,
    pub domain_stats: BTreeMap<Domain, DomainStats>,
    pub latencies_ms: VecDeque<u64>,
    /// Requests this model took part in
    pub query_runs: u64,
    /// Requests this model took part in that ended successfully
    pub query_successes: u64,
}

impl Default for ModelPerformance {
    fn default() -> Self {
        Self::new("")
    }
}

impl ModelPerformance {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            total_tokens: 0,
            total_cost: 0.0,
            calls: 0,
            successes: 0,
            failures: 0,
            quality_scores: VecDeque::new(),
            domain_stats: BTreeMap::new(),
            latencies_ms: VecDeque::new(),
            query_runs: 0,
            query_successes: 0,
        }
    }

    /// Aggregate one call's token/cost usage and its quality score
    pub fn record_usage(&mut self, tokens: u64, cost: f64, quality: f64) {
        self.calls += 1;
        self.total_tokens = self.total_tokens.saturating_add(tokens);
        if cost.is_finite() && cost > 0.0 {
            self.total_cost += cost;
        }
        push_bounded(&mut self.quality_scores, quality.clamp(0.0, 1.0), QUALITY_WINDOW);
    }

    /// Record a pass/fail outcome, overall and for `domain`
    pub fn mark_outcome(&mut self, success: bool, domain: Domain) {
        let stats = self.domain_stats.entry(domain).or_default();
        if success {
            self.successes += 1;
            stats.successes += 1;
        } else {
            self.failures += 1;
            stats.failures += 1;
        }
    }

    /// Record participation in one request
    pub fn record_run(&mut self, success: bool, latency_ms: u64) {
        self.query_runs += 1;
        if success {
            self.query_successes += 1;
        }
        push_bounded(&mut self.latencies_ms, latency_ms, LATENCY_WINDOW);
    }

    pub fn outcomes(&self) -> u64 {
        self.successes + self.failures
    }

    /// Success rate over all outcomes; [`NEUTRAL_PRIOR`] when none are recorded
    pub fn success_rate(&self) -> f64 {
        match self.outcomes() {
            0 => NEUTRAL_PRIOR,
            n => self.successes as f64 / n as f64,
        }
    }

    /// Mean of the quality window; [`NEUTRAL_PRIOR`] when empty
    pub fn avg_quality(&self) -> f64 {
        if self.quality_scores.is_empty() {
            return NEUTRAL_PRIOR;
        }
        self.quality_scores.iter().sum::<f64>() / self.quality_scores.len() as f64
    }

    pub fn avg_latency_ms(&self) -> Option<f64> {
        if self.latencies_ms.is_empty() {
            return None;
        }
        Some(self.latencies_ms.iter().sum::<u64>() as f64 / self.latencies_ms.len() as f64)
    }

    /// Fraction of requests that ended successfully
    pub fn query_accuracy(&self) -> Option<f64> {
        (self.query_runs > 0).then(|| self.query_successes as f64 / self.query_runs as f64)
    }

    pub fn domain(&self, domain: Domain) -> DomainStats {
        self.domain_stats.get(&domain).copied().unwrap_or_default()
    }
}

fn push_bounded<T>(window: &mut VecDeque<T>, value: T, cap: usize) {
    window.push_back(value);
    while window.len() > cap {
        window.pop_front();
    }
}

/// Immutable copy of every model's ledger, safe to share with readers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    models: BTreeMap<String, ModelPerformance>,
}

impl PerformanceSnapshot {
    pub fn new(models: BTreeMap<String, ModelPerformance>) -> Self {
        Self { models }
    }

    pub fn get(&self, model: &str) -> Option<&ModelPerformance> {
        self.models.get(model)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModelPerformance)> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model with the best success rate in `domain` among those with at
    /// least `min_samples` outcomes there. Ties resolve by name.
    pub fn best_for_domain(&self, domain: Domain, min_samples: u64) -> Option<(&str, f64)> {
        self.models
            .iter()
            .filter_map(|(name, perf)| {
                let stats = perf.domain(domain);
                if stats.samples() < min_samples {
                    return None;
                }
                stats.success_rate().map(|rate| (name.as_str(), rate))
            })
            .fold(None, |best: Option<(&str, f64)>, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })
    }

    pub fn into_inner(self) -> BTreeMap<String, ModelPerformance> {
        self.models
    }
}
