//! Builds the client registry from configuration.
//!
//! Each catalog model is resolved to a provider once: the explicit
//! `[providers.routing]` entry first, then the profile's own provider key.
//! Providers whose command is not on `PATH` are reported and their models
//! are dropped from the catalog, so routing never selects them.

use super::command::CommandModelClient;
use crate::config::FileConfig;
use conclave_application::{ClientRegistry, ModelClient};
use conclave_domain::{ConfigIssue, ConfigIssueCode, ModelRegistry};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Routable catalog plus the clients serving it
pub struct ProviderSetup {
    pub registry: ModelRegistry,
    pub clients: ClientRegistry,
    /// Providers and models that could not be wired
    pub issues: Vec<ConfigIssue>,
}

/// Build clients, checking provider commands with `which`
pub fn build_clients(config: &FileConfig) -> ProviderSetup {
    build_clients_with(config, |command| which::which(command).is_ok())
}

/// Build clients with a custom command check
pub fn build_clients_with(
    config: &FileConfig,
    command_exists: impl Fn(&str) -> bool,
) -> ProviderSetup {
    let mut issues = Vec::new();
    let mut providers: BTreeMap<&str, Arc<dyn ModelClient>> = BTreeMap::new();

    for (name, provider) in &config.providers.commands {
        if provider.command.trim().is_empty() {
            continue;
        }
        if !command_exists(&provider.command) {
            warn!(
                "Provider {} unavailable: command '{}' not found",
                name, provider.command
            );
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ProviderUnavailable {
                    provider: name.clone(),
                },
                format!(
                    "provider '{}': command '{}' not found on PATH; its models are excluded",
                    name, provider.command
                ),
            ));
            continue;
        }
        let mut client = CommandModelClient::new(name.as_str(), provider.command.as_str())
            .with_args(provider.args.iter().cloned());
        if let Some(secs) = provider.timeout_seconds {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        providers.insert(name.as_str(), Arc::new(client));
    }

    let catalog = config.catalog();
    let mut clients = ClientRegistry::new().with_timeout(config.router.call_timeout());
    let mut unserved: BTreeSet<&str> = BTreeSet::new();

    for profile in catalog.profiles() {
        let provider = config.providers.provider_for(profile);
        match providers.get(provider) {
            Some(client) => {
                debug!("Routing {} through {}", profile.name, provider);
                clients.register(profile.name.clone(), Arc::clone(client));
            }
            None => {
                if !config.providers.is_defined(provider) {
                    unserved.insert(provider);
                }
            }
        }
    }

    for provider in unserved {
        issues.push(ConfigIssue::warning(
            ConfigIssueCode::ProviderUnavailable {
                provider: provider.to_string(),
            },
            format!("provider '{provider}' is not configured; its models are excluded"),
        ));
    }

    let registry = catalog.retain(|profile| clients.contains(&profile.name));
    info!(
        "{} of {} catalog models routable",
        registry.len(),
        config.catalog().len()
    );

    ProviderSetup {
        registry,
        clients,
        issues,
    }
}
