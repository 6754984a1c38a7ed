//! Process-wide performance tracker.
//!
//! One instance per process, shared by handle with the router, ensemble and
//! planner. Mutations and the write-through save of [`log_run`] happen
//! under one re-entrant lock, so readers never observe a half-applied
//! update.
//!
//! [`log_run`]: PerformanceTracker::log_run

use crate::ports::performance_store::{NullPerformanceStore, PerformanceStore};
use conclave_domain::{Domain, ModelPerformance, ModelResponse, PerformanceSnapshot};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub struct PerformanceTracker {
    models: ReentrantMutex<RefCell<BTreeMap<String, ModelPerformance>>>,
    store: Box<dyn PerformanceStore>,
}

impl PerformanceTracker {
    /// Load history from `store`; an unreadable store starts empty.
    pub fn new(store: Box<dyn PerformanceStore>) -> Self {
        let models = match store.load() {
            Ok(models) => {
                debug!(models = models.len(), "Loaded performance history");
                models
            }
            Err(e) => {
                warn!(error = %e, "Could not load performance history, starting empty");
                BTreeMap::new()
            }
        };
        Self {
            models: ReentrantMutex::new(RefCell::new(models)),
            store,
        }
    }

    /// Tracker without persistence
    pub fn in_memory() -> Self {
        Self::new(Box::new(NullPerformanceStore))
    }

    fn with_model<R>(&self, model: &str, f: impl FnOnce(&mut ModelPerformance) -> R) -> R {
        let guard = self.models.lock();
        let mut models = guard.borrow_mut();
        let perf = models
            .entry(model.to_string())
            .or_insert_with(|| ModelPerformance::new(model));
        f(perf)
    }

    pub fn record_usage(&self, model: &str, tokens: u64, cost: f64, quality: f64) {
        self.with_model(model, |p| p.record_usage(tokens, cost, quality));
    }

    pub fn mark_outcome(&self, model: &str, success: bool, domain: Domain) {
        self.with_model(model, |p| p.mark_outcome(success, domain));
    }

    /// Usage plus pass/fail for one scored response
    pub fn record_response(&self, response: &ModelResponse, domain: Domain) {
        let guard = self.models.lock();
        self.record_usage(
            &response.model,
            response.tokens.unwrap_or(0),
            response.cost.unwrap_or(0.0),
            response.quality_score,
        );
        self.mark_outcome(&response.model, response.passed, domain);
        drop(guard);
    }

    /// Record request-level outcome for every participating model, then
    /// persist the whole ledger before releasing the lock.
    ///
    /// A failed save is logged; the in-memory update stands.
    pub fn log_run(&self, models: &[String], success: bool, latency_ms: u64, domain: Domain) {
        let guard = self.models.lock();
        for model in models {
            self.with_model(model, |p| p.record_run(success, latency_ms));
        }
        debug!(
            models = models.len(),
            success,
            latency_ms,
            domain = %domain,
            "Recorded run"
        );
        let result = self.store.save(&guard.borrow());
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist performance history");
        }
    }

    pub fn get(&self, model: &str) -> Option<ModelPerformance> {
        let guard = self.models.lock();
        let perf = guard.borrow().get(model).cloned();
        perf
    }

    /// Immutable copy of the whole ledger
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let guard = self.models.lock();
        let models = guard.borrow().clone();
        PerformanceSnapshot::new(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::performance_store::StoreError;
    use conclave_domain::{CallOutcome, QualityAssessment};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Store that remembers every save
    #[derive(Clone, Default)]
    struct RecordingStore {
        initial: BTreeMap<String, ModelPerformance>,
        saves: Arc<Mutex<Vec<BTreeMap<String, ModelPerformance>>>>,
        fail: bool,
    }

    impl PerformanceStore for RecordingStore {
        fn load(&self) -> Result<BTreeMap<String, ModelPerformance>, StoreError> {
            if self.fail {
                return Err(StoreError::Serialization("corrupt".to_string()));
            }
            Ok(self.initial.clone())
        }

        fn save(&self, models: &BTreeMap<String, ModelPerformance>) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Serialization("read-only".to_string()));
            }
            self.saves.lock().push(models.clone());
            Ok(())
        }
    }

    #[test]
    fn test_loads_history_at_startup() {
        let mut perf = ModelPerformance::new("m");
        perf.record_usage(10, 0.0, 0.9);
        let store = RecordingStore {
            initial: BTreeMap::from([("m".to_string(), perf)]),
            ..Default::default()
        };
        let tracker = PerformanceTracker::new(Box::new(store));
        assert_eq!(tracker.get("m").map(|p| p.calls), Some(1));
    }

    #[test]
    fn test_unreadable_store_starts_empty() {
        let store = RecordingStore {
            fail: true,
            ..Default::default()
        };
        let tracker = PerformanceTracker::new(Box::new(store));
        assert!(tracker.snapshot().is_empty());
        // Save failure is swallowed
        tracker.log_run(&["m".to_string()], true, 10, Domain::General);
        assert_eq!(tracker.get("m").map(|p| p.query_runs), Some(1));
    }

    #[test]
    fn test_log_run_writes_through() {
        let store = RecordingStore::default();
        let saves = Arc::clone(&store.saves);
        let tracker = PerformanceTracker::new(Box::new(store));

        tracker.log_run(
            &["a".to_string(), "b".to_string()],
            true,
            120,
            Domain::Coding,
        );

        let saves = saves.lock();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0]["a"].query_successes, 1);
        assert_eq!(saves[0]["b"].latencies_ms.len(), 1);
    }

    #[test]
    fn test_record_response_updates_counters() {
        let tracker = PerformanceTracker::in_memory();
        let response = ModelResponse::from_outcome(
            "m",
            CallOutcome::success("a reasonable answer here"),
            QualityAssessment {
                score: 0.8,
                confidence: 0.6,
            },
            0.5,
            40,
        );
        tracker.record_response(&response, Domain::Math);
        let failed = ModelResponse::failure("m", "timeout");
        tracker.record_response(&failed, Domain::Math);

        let perf = tracker.get("m").unwrap();
        assert_eq!(perf.calls, 2);
        assert_eq!(perf.domain(Domain::Math).successes, 1);
        assert_eq!(perf.domain(Domain::Math).failures, 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let tracker = PerformanceTracker::in_memory();
        tracker.mark_outcome("m", true, Domain::General);
        let snapshot = tracker.snapshot();
        tracker.mark_outcome("m", false, Domain::General);
        assert_eq!(snapshot.get("m").map(|p| p.failures), Some(0));
    }

    #[test]
    fn test_concurrent_updates() {
        let tracker = Arc::new(PerformanceTracker::in_memory());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        tracker.record_usage("m", 1, 0.0, 0.5);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.get("m").unwrap().total_tokens, 100);
    }
}
