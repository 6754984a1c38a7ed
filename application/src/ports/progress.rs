//! Progress notification port
//!
//! Defines the interface for reporting progress during orchestration.

use conclave_domain::Phase;

/// Callback for progress updates during orchestration
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: Phase, total_tasks: usize);

    /// Called when one model finishes its task within a phase
    fn on_model_complete(&self, phase: Phase, model: &str, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: Phase);

    /// Called after each debate or diffusion round
    fn on_round_complete(&self, _phase: Phase, _round: usize, _score: f64) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _total_tasks: usize) {}
    fn on_model_complete(&self, _phase: Phase, _model: &str, _success: bool) {}
    fn on_phase_complete(&self, _phase: Phase) {}
}
