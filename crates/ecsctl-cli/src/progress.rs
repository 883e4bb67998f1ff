//! Terminal rendering of rollout progress.

use std::cell::Cell;
use std::io::Write;
use std::time::Duration;

use ecsctl_rollout::{CycleReport, RolloutProgress, WaitState};

/// Prints each cycle's health report to stdout and a one-line countdown
/// between cycles.
#[derive(Debug, Default)]
pub struct TerminalProgress {
    countdown_shown: Cell<bool>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_countdown(&self) {
        if self.countdown_shown.replace(false) {
            println!();
        }
    }
}

impl RolloutProgress for TerminalProgress {
    fn on_cycle(&self, report: &CycleReport) {
        self.end_countdown();
        println!(
            "🔄 Poll cycle {} ({}s elapsed)",
            report.cycle,
            report.elapsed.as_secs()
        );
        print!("{report}");
    }

    fn on_waiting(&self, remaining: Duration) {
        self.countdown_shown.set(true);
        print!("\r⏳ Next check in {:>4}s", remaining.as_secs().max(1));
        let _ = std::io::stdout().flush();
    }

    fn on_finish(&self, state: WaitState) {
        self.end_countdown();
        match state {
            WaitState::Converged => println!("🎉 All services settled."),
            WaitState::FailedCritical => println!("💀 Primary deployment failed. Exiting."),
            WaitState::TimedOut => println!("⌛ Timed out waiting for services to settle."),
            WaitState::Polling => {}
        }
    }
}
