//! Infrastructure layer for conclave
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod persistence;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, ConfigSourceKind, FileConfig, FileLoggingConfig,
    FileProviderConfig, FileProvidersConfig, FileTrackerConfig,
};
pub use logging::JsonlRunLogger;
pub use persistence::JsonFilePerformanceStore;
pub use providers::{CommandModelClient, ProviderSetup, build_clients, build_clients_with};
