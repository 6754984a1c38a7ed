//! JSON file performance store.
//!
//! The whole ledger is one JSON object keyed by model name. Saves write a
//! sibling temp file and rename it over the old one.

use conclave_application::{PerformanceStore, StoreError};
use conclave_domain::ModelPerformance;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonFilePerformanceStore {
    path: PathBuf,
}

impl JsonFilePerformanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PerformanceStore for JsonFilePerformanceStore {
    fn load(&self) -> Result<BTreeMap<String, ModelPerformance>, StoreError> {
        if !self.path.exists() {
            debug!("No performance ledger at {}", self.path.display());
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let models: BTreeMap<String, ModelPerformance> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(
            "Loaded performance for {} models from {}",
            models.len(),
            self.path.display()
        );
        Ok(models)
    }

    fn save(&self, models: &BTreeMap<String, ModelPerformance>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(models)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::Domain;

    fn ledger() -> BTreeMap<String, ModelPerformance> {
        let mut perf = ModelPerformance::new("gpt-4o");
        perf.record_usage(120, 0.01, 0.8);
        perf.mark_outcome(true, Domain::Coding);
        BTreeMap::from([("gpt-4o".to_string(), perf)])
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePerformanceStore::new(dir.path().join("perf.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("perf.json");
        let store = JsonFilePerformanceStore::new(&path);

        store.save(&ledger()).unwrap();
        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["gpt-4o"].calls, 1);
        assert_eq!(loaded["gpt-4o"].total_tokens, 120);
        assert_eq!(loaded["gpt-4o"].domain(Domain::Coding).successes, 1);
    }

    #[test]
    fn test_save_rewrites_whole_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePerformanceStore::new(dir.path().join("perf.json"));
        store.save(&ledger()).unwrap();

        let other = BTreeMap::from([(
            "claude-3-5-haiku".to_string(),
            ModelPerformance::new("claude-3-5-haiku"),
        )]);
        store.save(&other).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("claude-3-5-haiku"));
    }

    #[test]
    fn test_corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFilePerformanceStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));
    }
}
