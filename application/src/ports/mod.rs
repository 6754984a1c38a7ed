//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod model_client;
pub mod performance_store;
pub mod plan_executor;
pub mod progress;
pub mod run_logger;
