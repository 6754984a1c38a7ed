//! Routing domain: topic classification and routing decisions.
//!
//! Classification is a cheap keyword heuristic. Its output biases model
//! selection and keys the per-domain success counters kept for each model.

pub mod decision;
pub mod domain;

pub use decision::{RoutingDecision, RoutingMode};
pub use domain::{Domain, QueryTraits};
