//! Performance store port
//!
//! The tracker reads the whole ledger once at startup and rewrites it
//! whole on every save.

use conclave_domain::ModelPerformance;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Durable storage for per-model performance, keyed by model name
pub trait PerformanceStore: Send + Sync {
    fn load(&self) -> Result<BTreeMap<String, ModelPerformance>, StoreError>;

    fn save(&self, models: &BTreeMap<String, ModelPerformance>) -> Result<(), StoreError>;
}

/// Store that keeps nothing; history lives only as long as the process
pub struct NullPerformanceStore;

impl PerformanceStore for NullPerformanceStore {
    fn load(&self) -> Result<BTreeMap<String, ModelPerformance>, StoreError> {
        Ok(BTreeMap::new())
    }

    fn save(&self, _models: &BTreeMap<String, ModelPerformance>) -> Result<(), StoreError> {
        Ok(())
    }
}
