//! Orchestration domain
//!
//! Phases a request moves through and the outcome it produces.

pub mod outcome;
pub mod phase;

pub use outcome::{AnswerStrategy, OrchestrationOutcome};
pub use phase::Phase;
