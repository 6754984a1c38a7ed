//! Raw TOML configuration data types
//!
//! These structs mirror the config file. Use-case sections reuse the
//! application config types directly; everything else is plain data that
//! the loader and the provider builder turn into runtime objects.

use conclave_application::{
    ConsensusConfig, DiffusionConfig, EnsembleConfig, OrchestrationConfig, RouterConfig,
};
use conclave_domain::{ConfigIssue, ConfigIssueCode, ModelProfile, ModelRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Raw performance tracker configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTrackerConfig {
    /// Where the performance ledger is kept
    pub store_path: Option<PathBuf>,
    /// Keep history in memory only
    pub ephemeral: bool,
}

impl FileTrackerConfig {
    /// Configured store path, or `$XDG_DATA_HOME/conclave/performance.json`
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        if self.ephemeral {
            return None;
        }
        self.store_path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("conclave").join("performance.json")))
    }
}

/// Raw run-log configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of orchestration events; disabled when unset
    pub run_log: Option<PathBuf>,
}

/// One command-backed provider
///
/// `{model}` in `args` is replaced with the model name; the prompt is
/// written to the command's stdin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_seconds: Option<u64>,
}

/// `[providers]` table: named providers plus explicit model routing
///
/// ```toml
/// [providers.ollama]
/// command = "ollama"
/// args = ["run", "{model}"]
///
/// [providers.routing]
/// "llama-3.1-70b" = "ollama"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileProvidersConfig {
    /// Model name -> provider name, checked before the profile's provider
    #[serde(default)]
    pub routing: BTreeMap<String, String>,
    #[serde(flatten)]
    pub commands: BTreeMap<String, FileProviderConfig>,
}

impl FileProvidersConfig {
    /// Provider that should serve `profile`
    pub fn provider_for<'a>(&'a self, profile: &'a ModelProfile) -> &'a str {
        self.routing
            .get(&profile.name)
            .map(String::as_str)
            .unwrap_or(&profile.provider)
    }

    pub fn is_defined(&self, provider: &str) -> bool {
        self.commands.contains_key(provider)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub router: RouterConfig,
    pub consensus: ConsensusConfig,
    pub ensemble: EnsembleConfig,
    pub diffusion: DiffusionConfig,
    pub tracker: FileTrackerConfig,
    pub logging: FileLoggingConfig,
    /// Model catalog; the built-in catalog is used when empty
    pub models: Vec<ModelProfile>,
    pub providers: FileProvidersConfig,
}

impl FileConfig {
    pub fn orchestration(&self) -> OrchestrationConfig {
        OrchestrationConfig {
            router: self.router.clone(),
            consensus: self.consensus.clone(),
            ensemble: self.ensemble.clone(),
            diffusion: self.diffusion.clone(),
        }
    }

    /// The configured catalog, before provider availability is applied
    pub fn catalog(&self) -> ModelRegistry {
        if self.models.is_empty() {
            ModelRegistry::builtin()
        } else {
            ModelRegistry::new(self.models.iter().cloned())
        }
    }

    /// Validate the configuration, reporting every issue found
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.orchestration().validate();

        for model in &self.models {
            if model.name.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    "[[models]] entry has an empty name",
                ));
            }
        }

        for (model, provider) in &self.providers.routing {
            if model.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    "[providers.routing] has an empty model name",
                ));
            }
            if !self.providers.is_defined(provider) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UndefinedProvider {
                        model: model.clone(),
                        provider: provider.clone(),
                    },
                    format!("{model} is routed to undefined provider '{provider}'"),
                ));
            }
        }

        for (name, provider) in &self.providers.commands {
            if provider.command.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ProviderUnavailable {
                        provider: name.clone(),
                    },
                    format!("provider '{name}' has no command"),
                ));
            }
        }

        issues
    }
}
