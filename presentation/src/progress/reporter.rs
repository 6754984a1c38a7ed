//! Progress reporting for orchestration runs

use colored::Colorize;
use conclave_application::ProgressNotifier;
use conclave_domain::Phase;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress with one bar per phase
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.phase_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: Phase, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(phase.display_name().to_string());
        pb.set_message("Starting...");

        if let Ok(mut guard) = self.phase_bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_model_complete(&self, _phase: Phase, model: &str, success: bool) {
        self.with_bar(|pb| {
            let status = if success {
                format!("{} {}", "v".green(), model)
            } else {
                format!("{} {}", "x".red(), model)
            };
            pb.set_message(status);
            pb.inc(1);
        });
    }

    fn on_round_complete(&self, _phase: Phase, round: usize, score: f64) {
        self.with_bar(|pb| pb.set_message(format!("round {} scored {:.2}", round, score)));
    }

    fn on_phase_complete(&self, phase: Phase) {
        let finished = self.phase_bar.lock().ok().and_then(|mut guard| guard.take());
        if let Some(pb) = finished {
            pb.finish_with_message(format!("{} complete", phase.display_name().green()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_lifecycle() {
        let reporter = ProgressReporter::new();
        reporter.on_phase_start(Phase::Answering, 2);
        reporter.on_model_complete(Phase::Answering, "a", true);
        reporter.on_model_complete(Phase::Answering, "b", false);
        reporter.with_bar(|pb| assert_eq!(pb.position(), 2));
        reporter.on_phase_complete(Phase::Answering);
        assert!(reporter.phase_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_events_without_a_phase_are_ignored() {
        let reporter = ProgressReporter::default();
        reporter.on_model_complete(Phase::Voting, "a", true);
        reporter.on_round_complete(Phase::Consensus, 1, 0.5);
        reporter.on_phase_complete(Phase::Voting);
    }
}
