//! ecsctl rollout engine: service discovery, health checks, convergence.
//!
//! After a new task definition is registered, this crate finds the
//! services that run its family, points them at the new revision, and
//! waits for ECS to finish rolling them out.
//!
//! # Components
//!
//! - **`locator`**: pages through a cluster's services and matches them by task family
//! - **`verifier`**: per-service checks (counts, task age, task definition, primary deployment)
//! - **`waiter`**: the polling state machine (converged / failed critically / timed out)
//! - **`progress`**: optional callbacks for rendering cycles and countdowns

pub mod locator;
pub mod progress;
pub mod verifier;
pub mod waiter;

#[cfg(test)]
mod testing;

pub use locator::ServiceLocator;
pub use progress::RolloutProgress;
pub use verifier::{Check, RolloutVerifier, ServiceHealth, VerifierConfig, fetch_tasks};
pub use waiter::{
    CycleReport, RolloutError, RolloutResult, RolloutSummary, RolloutWaiter, ServicesByCluster,
    WaitState, group_by_cluster, next_state, unix_now,
};
