//! Configuration file loading for conclave
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./conclave.toml` or `./.conclave.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/conclave/config.toml`
//! 4. `CONCLAVE_`-prefixed environment variables
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileLoggingConfig, FileProviderConfig, FileProvidersConfig, FileTrackerConfig,
};
pub use loader::{ConfigLoader, ConfigSource, ConfigSourceKind};
