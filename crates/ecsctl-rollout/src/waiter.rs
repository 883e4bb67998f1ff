//! Rollout waiter: polls tracked services until the rollout settles.
//!
//! ```text
//!            ┌──────────── sleep(min(poll interval, time left)) ───┐
//!            ▼                                                     │
//!        POLLING ── critical ──────────────▶ FAILED_CRITICAL       │
//!            │  ── no failures ────────────▶ CONVERGED             │
//!            │  ── deadline passed ────────▶ TIMED_OUT             │
//!            └── failures, time left ──────────────────────────────┘
//! ```
//!
//! Every cycle re-describes every service from scratch; the only state
//! carried between cycles is the cycle counter and the deadline, which is
//! fixed once when waiting starts.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use ecsctl_core::*;

use crate::progress::RolloutProgress;
use crate::verifier::{RolloutVerifier, ServiceHealth, VerifierConfig};

/// Tracked services keyed by cluster name.
pub type ServicesByCluster = BTreeMap<String, Vec<ServiceRef>>;

/// Group service references by their cluster.
pub fn group_by_cluster(services: impl IntoIterator<Item = ServiceRef>) -> ServicesByCluster {
    let mut grouped = ServicesByCluster::new();
    for service in services {
        grouped
            .entry(service.cluster_name.clone())
            .or_default()
            .push(service);
    }
    grouped
}

/// Waiter lifecycle. Everything but `Polling` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Polling,
    Converged,
    FailedCritical,
    TimedOut,
}

impl WaitState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WaitState::Polling)
    }
}

/// What one poll cycle observed.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u32,
    pub elapsed: Duration,
    pub services: Vec<ServiceHealth>,
    /// Tracked services the API no longer returns.
    pub missing: Vec<ServiceRef>,
    pub outcome: PollOutcome,
}

impl CycleReport {
    /// `cluster/service` of every service whose checks went critical.
    pub fn critical_services(&self) -> Vec<String> {
        self.services
            .iter()
            .filter(|h| h.outcome().critical)
            .map(|h| format!("{}/{}", h.service.cluster_name, h.service.service_name))
            .collect()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for health in &self.services {
            write!(f, "{health}")?;
        }
        for service in &self.missing {
            writeln!(
                f,
                "❓ Service {} in cluster {} was not returned by the API",
                service.service_name, service.cluster_name
            )?;
        }
        Ok(())
    }
}

/// Successful end of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloutSummary {
    pub cycles: u32,
    pub services: usize,
    pub elapsed: Duration,
}

pub type RolloutResult<T> = Result<T, RolloutError>;

#[derive(Debug, Error)]
pub enum RolloutError {
    /// Describe/list calls failed; polling is aborted, not retried.
    #[error(transparent)]
    Api(#[from] EcsError),

    #[error("rollout failed for {}; primary deployment will not converge", .services.join(", "))]
    Critical { services: Vec<String>, cycles: u32 },

    #[error(
        "timed out after {}s waiting for rollout, {failures} check(s) still failing after {cycles} poll cycle(s)",
        .timeout.as_secs()
    )]
    TimedOut {
        timeout: Duration,
        failures: u32,
        cycles: u32,
    },
}

impl RolloutError {
    /// Terminal waiter state this error represents, if any.
    pub fn state(&self) -> Option<WaitState> {
        match self {
            RolloutError::Api(_) => None,
            RolloutError::Critical { .. } => Some(WaitState::FailedCritical),
            RolloutError::TimedOut { .. } => Some(WaitState::TimedOut),
        }
    }
}

/// Seconds since the Unix epoch according to the system clock.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Polls services until they converge, one fails critically, or the
/// timeout elapses.
pub struct RolloutWaiter<'a, C, P = ()> {
    client: &'a C,
    config: WaitConfig,
    verifier: RolloutVerifier,
    progress: P,
    clock: fn() -> i64,
    tick: Duration,
}

impl<'a, C: EcsApi> RolloutWaiter<'a, C> {
    pub fn new(client: &'a C, config: WaitConfig) -> Self {
        Self {
            client,
            verifier: RolloutVerifier::new(VerifierConfig::from(&config)),
            config,
            progress: (),
            clock: unix_now,
            tick: Duration::from_secs(1),
        }
    }
}

impl<'a, C: EcsApi, P: RolloutProgress> RolloutWaiter<'a, C, P> {
    pub fn with_progress<Q: RolloutProgress>(self, progress: Q) -> RolloutWaiter<'a, C, Q> {
        RolloutWaiter {
            client: self.client,
            config: self.config,
            verifier: self.verifier,
            progress,
            clock: self.clock,
            tick: self.tick,
        }
    }

    /// Wall clock used to age tasks (seconds since the Unix epoch).
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Granularity of `on_waiting` progress callbacks.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Wait until every service in `services` has settled.
    pub async fn wait_for_all(&self, services: &ServicesByCluster) -> RolloutResult<RolloutSummary> {
        let started = Instant::now();
        let timeout = self.config.timeout();
        let deadline = started + timeout;
        let tracked: usize = services.values().map(Vec::len).sum();

        info!(
            services = tracked,
            clusters = services.len(),
            timeout_secs = timeout.as_secs(),
            poll_interval_secs = self.config.poll_interval_secs,
            "waiting for services to settle"
        );

        let mut cycle = 0u32;
        loop {
            cycle += 1;
            let report = self.poll_cycle(services, cycle, started).await?;
            self.progress.on_cycle(&report);

            let state = next_state(report.outcome, Instant::now() >= deadline);
            match state {
                WaitState::FailedCritical => {
                    let services = report.critical_services();
                    warn!(cycle, services = ?services, "rollout failed critically");
                    self.progress.on_finish(state);
                    return Err(RolloutError::Critical {
                        services,
                        cycles: cycle,
                    });
                }
                WaitState::Converged => {
                    let elapsed = started.elapsed();
                    info!(cycle, elapsed_secs = elapsed.as_secs(), "all services settled");
                    self.progress.on_finish(state);
                    return Ok(RolloutSummary {
                        cycles: cycle,
                        services: tracked,
                        elapsed,
                    });
                }
                WaitState::TimedOut => {
                    return Err(self.timed_out(timeout, report.outcome.failures, cycle));
                }
                WaitState::Polling => {}
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let pause = self.config.poll_interval().min(remaining);
            debug!(
                cycle,
                failures = report.outcome.failures,
                pause_secs = pause.as_secs(),
                "services not settled yet"
            );
            self.pause(pause).await;

            if Instant::now() >= deadline {
                return Err(self.timed_out(timeout, report.outcome.failures, cycle));
            }
        }
    }

    /// Describe every tracked service afresh and evaluate it.
    pub async fn poll_cycle(
        &self,
        services: &ServicesByCluster,
        cycle: u32,
        started: Instant,
    ) -> EcsResult<CycleReport> {
        let mut healths = Vec::new();
        let mut missing = Vec::new();

        for (cluster, refs) in services {
            let mut described = Vec::with_capacity(refs.len());
            for batch in refs.chunks(MAX_DESCRIBE_SERVICES) {
                let response = self
                    .client
                    .describe_services(&DescribeServicesRequest {
                        cluster: cluster.clone(),
                        services: batch.iter().map(|s| s.service_arn.clone()).collect(),
                    })
                    .await?;
                for failure in &response.failures {
                    debug!(%cluster, arn = %failure.arn, reason = %failure.reason, "describe failure");
                }
                described.extend(response.services.into_iter().map(|mut desc| {
                    desc.cluster_name = cluster.clone();
                    desc
                }));
            }

            for service in refs {
                let found = described.iter().any(|d| {
                    d.service_arn == service.service_arn || d.service_name == service.service_name
                });
                if !found {
                    warn!(%cluster, service = %service.service_name, "tracked service not returned");
                    missing.push(service.clone());
                }
            }

            for desc in &described {
                let now = (self.clock)();
                healths.push(self.verifier.check_service(self.client, desc, now).await?);
            }
        }

        let outcome = healths.iter().map(ServiceHealth::outcome).sum::<PollOutcome>()
            + PollOutcome {
                failures: missing.len() as u32,
                critical: false,
            };

        Ok(CycleReport {
            cycle,
            elapsed: started.elapsed(),
            services: healths,
            missing,
            outcome,
        })
    }

    async fn pause(&self, duration: Duration) {
        let until = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= until {
                break;
            }
            let remaining = until - now;
            self.progress.on_waiting(remaining);
            tokio::time::sleep(remaining.min(self.tick)).await;
        }
    }

    fn timed_out(&self, timeout: Duration, failures: u32, cycles: u32) -> RolloutError {
        warn!(cycles, failures, timeout_secs = timeout.as_secs(), "rollout wait timed out");
        self.progress.on_finish(WaitState::TimedOut);
        RolloutError::TimedOut {
            timeout,
            failures,
            cycles,
        }
    }
}

/// Transition out of `Polling` after a cycle with `outcome`.
pub fn next_state(outcome: PollOutcome, deadline_passed: bool) -> WaitState {
    if outcome.critical {
        WaitState::FailedCritical
    } else if outcome.failures == 0 {
        WaitState::Converged
    } else if deadline_passed {
        WaitState::TimedOut
    } else {
        WaitState::Polling
    }
}
