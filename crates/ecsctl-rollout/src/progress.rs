//! Progress callbacks for the rollout waiter.
//!
//! The waiter reports through this trait instead of printing, so a CLI can
//! render per-cycle reports and a countdown while library callers stay
//! silent. Callbacks are synchronous and must return quickly.

use std::time::Duration;

use crate::waiter::{CycleReport, WaitState};

pub trait RolloutProgress {
    /// A poll cycle finished evaluating every tracked service.
    fn on_cycle(&self, _report: &CycleReport) {}

    /// Called once per tick while sleeping between cycles.
    fn on_waiting(&self, _remaining: Duration) {}

    /// The waiter reached a terminal state.
    fn on_finish(&self, _state: WaitState) {}
}

/// Reports nothing.
impl RolloutProgress for () {}

impl<P: RolloutProgress + ?Sized> RolloutProgress for &P {
    fn on_cycle(&self, report: &CycleReport) {
        (**self).on_cycle(report)
    }

    fn on_waiting(&self, remaining: Duration) {
        (**self).on_waiting(remaining)
    }

    fn on_finish(&self, state: WaitState) {
        (**self).on_finish(state)
    }
}
