//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelProfile`]: static description of a model endpoint
//! - [`model::Capability`]: capability tags used for model selection
//! - [`validation::ConfigIssue`]: structured configuration problems
//! - [`error::DomainError`]: domain-level errors
//! - [`text`]: word/entity helpers used by the scoring heuristics

pub mod error;
pub mod model;
pub mod text;
pub mod validation;
