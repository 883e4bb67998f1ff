//! Per-service rollout health checks.
//!
//! Every check runs on every evaluation; each failing check adds one
//! failure. Only a FAILED (or absent) primary deployment marks the outcome
//! critical, which tells the waiter that polling further is pointless.

use std::fmt;

use tracing::debug;

use ecsctl_core::*;

/// Thresholds applied by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Tasks younger than this are not counted as settled.
    pub min_task_age_secs: i64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            min_task_age_secs: 60,
        }
    }
}

impl From<&WaitConfig> for VerifierConfig {
    fn from(config: &WaitConfig) -> Self {
        Self {
            min_task_age_secs: i64::try_from(config.min_task_age_secs).unwrap_or(i64::MAX),
        }
    }
}

/// A single health check and what it observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    RunningCount { desired: i32, running: i32 },
    PendingCount { pending: i32 },
    TaskAge { task_arn: String, age_secs: i64, min_age_secs: i64 },
    TaskDefinition { task_arn: String, actual: String, expected: String },
    PrimaryDeployment { rollout_state: Option<RolloutState> },
    MissingPrimaryDeployment,
}

impl Check {
    pub fn passed(&self) -> bool {
        match self {
            Check::RunningCount { desired, running } => desired == running,
            Check::PendingCount { pending } => *pending == 0,
            Check::TaskAge { age_secs, min_age_secs, .. } => age_secs >= min_age_secs,
            Check::TaskDefinition { actual, expected, .. } => actual == expected,
            Check::PrimaryDeployment { rollout_state } => {
                rollout_state.as_ref() != Some(&RolloutState::Failed)
            }
            Check::MissingPrimaryDeployment => false,
        }
    }

    /// Whether this check failing means the rollout can never converge.
    pub fn is_critical(&self) -> bool {
        match self {
            Check::PrimaryDeployment { rollout_state } => {
                rollout_state.as_ref() == Some(&RolloutState::Failed)
            }
            Check::MissingPrimaryDeployment => true,
            _ => false,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed() { "✅" } else if self.is_critical() { "💀" } else { "❌" };
        match self {
            Check::RunningCount { running, .. } => write!(f, "{mark} Running task count: {running}"),
            Check::PendingCount { pending } => write!(f, "{mark} Pending task count: {pending}"),
            Check::TaskAge { task_arn, age_secs, min_age_secs } => {
                if self.passed() {
                    write!(f, "{mark} Task {task_arn} age is OK ({age_secs}s)")
                } else {
                    write!(
                        f,
                        "{mark} Task {task_arn} is too young ({age_secs}s, {min_age_secs}s minimum)"
                    )
                }
            }
            Check::TaskDefinition { task_arn, actual, .. } => {
                if self.passed() {
                    write!(f, "{mark} Task {task_arn} task definition is OK")
                } else {
                    write!(f, "{mark} Task {task_arn} task definition is {actual}")
                }
            }
            Check::PrimaryDeployment { rollout_state } => match rollout_state {
                Some(RolloutState::Completed) => write!(f, "{mark} Primary deployment completed"),
                Some(RolloutState::InProgress) => {
                    write!(f, "🔧 Primary deployment is still in progress")
                }
                Some(RolloutState::Failed) => write!(f, "{mark} Primary deployment failed"),
                Some(RolloutState::Other(state)) => {
                    write!(f, "🔧 Primary deployment rollout state is {state}")
                }
                None => write!(f, "{mark} Primary deployment reports no rollout state"),
            },
            Check::MissingPrimaryDeployment => write!(f, "{mark} Service has no primary deployment"),
        }
    }
}

/// Health of one service in one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub service: ServiceRef,
    pub desired_count: i32,
    pub desired_task_definition: String,
    pub checks: Vec<Check>,
}

impl ServiceHealth {
    pub fn outcome(&self) -> PollOutcome {
        PollOutcome {
            failures: self.checks.iter().filter(|c| !c.passed()).count() as u32,
            critical: self.checks.iter().any(Check::is_critical),
        }
    }

    pub fn failing_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed())
    }
}

impl fmt::Display for ServiceHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🔍 Running checks")?;
        writeln!(f, "🌎 Cluster: {}", self.service.cluster_name)?;
        writeln!(f, "🏓 Service: {}", self.service.service_name)?;
        writeln!(f, "    👮 Desired task count: {}", self.desired_count)?;
        writeln!(f, "    👮 Desired task definition: {}", self.desired_task_definition)?;
        for check in &self.checks {
            writeln!(f, "    {check}")?;
        }
        let outcome = self.outcome();
        if outcome.is_settled() {
            writeln!(f, "    ✅ Service updated successfully.")?;
        } else {
            writeln!(f, "    ⏳ {} check(s) failing", outcome.failures)?;
        }
        Ok(())
    }
}

/// Evaluates services against the rollout health criteria.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutVerifier {
    config: VerifierConfig,
}

impl RolloutVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Evaluate a service snapshot and its tasks at time `now`
    /// (seconds since the Unix epoch). Pure: the same inputs always give
    /// the same result.
    pub fn evaluate(&self, desc: &ServiceDescription, tasks: &[TaskSnapshot], now: i64) -> ServiceHealth {
        let mut checks = vec![
            Check::RunningCount {
                desired: desc.desired_count,
                running: desc.running_count,
            },
            Check::PendingCount {
                pending: desc.pending_count,
            },
        ];

        for task in tasks {
            checks.push(Check::TaskAge {
                task_arn: task.task_arn.clone(),
                age_secs: task.age_secs(now),
                min_age_secs: self.config.min_task_age_secs,
            });
            checks.push(Check::TaskDefinition {
                task_arn: task.task_arn.clone(),
                actual: task.task_definition_arn.clone(),
                expected: desc.task_definition.clone(),
            });
        }

        checks.push(match desc.primary_deployment() {
            Some(primary) => Check::PrimaryDeployment {
                rollout_state: primary.rollout_state.clone(),
            },
            None => Check::MissingPrimaryDeployment,
        });

        ServiceHealth {
            service: desc.service_ref(),
            desired_count: desc.desired_count,
            desired_task_definition: desc.task_definition.clone(),
            checks,
        }
    }

    /// Fetch the service's current tasks and evaluate it.
    pub async fn check_service<C: EcsApi>(
        &self,
        client: &C,
        desc: &ServiceDescription,
        now: i64,
    ) -> EcsResult<ServiceHealth> {
        let tasks = fetch_tasks(client, &desc.cluster_name, &desc.service_name).await?;
        let health = self.evaluate(desc, &tasks, now);
        let outcome = health.outcome();
        debug!(
            cluster = %desc.cluster_name,
            service = %desc.service_name,
            tasks = tasks.len(),
            failures = outcome.failures,
            critical = outcome.critical,
            "service checked"
        );
        Ok(health)
    }
}

/// Every task currently belonging to `service_name`, described in
/// batches the API accepts.
pub async fn fetch_tasks<C: EcsApi>(
    client: &C,
    cluster: &str,
    service_name: &str,
) -> EcsResult<Vec<TaskSnapshot>> {
    let mut task_arns = Vec::new();
    let mut request = ListTasksRequest {
        cluster: cluster.to_string(),
        service_name: service_name.to_string(),
        next_token: None,
    };
    loop {
        let page = client.list_tasks(&request).await?;
        task_arns.extend(page.task_arns);
        match page.next_token {
            Some(token) => request.next_token = Some(token),
            None => break,
        }
    }

    let mut tasks = Vec::with_capacity(task_arns.len());
    for batch in task_arns.chunks(MAX_DESCRIBE_TASKS) {
        let described = client
            .describe_tasks(&DescribeTasksRequest {
                cluster: cluster.to_string(),
                tasks: batch.to_vec(),
            })
            .await?;
        tasks.extend(described.tasks);
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    const NOW: i64 = 1_700_000_000;

    fn healthy_tasks() -> Vec<TaskSnapshot> {
        vec![task("a", TD_V2, NOW - 120), task("b", TD_V2, NOW - 120)]
    }

    #[test]
    fn settled_service_has_no_failures() {
        let desc = service("web", 2, 2, 0, RolloutState::Completed);
        let health = RolloutVerifier::default().evaluate(&desc, &healthy_tasks(), NOW);
        assert_eq!(health.outcome(), PollOutcome { failures: 0, critical: false });
    }

    #[test]
    fn in_progress_primary_is_not_a_failure() {
        let desc = service("web", 2, 2, 0, RolloutState::InProgress);
        let health = RolloutVerifier::default().evaluate(&desc, &healthy_tasks(), NOW);
        assert_eq!(health.outcome(), PollOutcome { failures: 0, critical: false });
    }

    #[test]
    fn every_check_counts_independently() {
        let desc = service("web", 3, 1, 2, RolloutState::InProgress);
        let tasks = vec![task("old", TD_V1, NOW - 3600), task("new", TD_V2, NOW - 5)];
        let health = RolloutVerifier::default().evaluate(&desc, &tasks, NOW);

        // running != desired, pending > 0, one task too young, one stale definition
        assert_eq!(health.outcome(), PollOutcome { failures: 4, critical: false });
        assert_eq!(health.failing_checks().count(), 4);
    }

    #[test]
    fn failed_primary_is_critical_regardless_of_counts() {
        for (running, pending) in [(2, 0), (0, 2)] {
            let desc = service("web", 2, running, pending, RolloutState::Failed);
            let health = RolloutVerifier::default().evaluate(&desc, &healthy_tasks(), NOW);
            let outcome = health.outcome();
            assert!(outcome.critical);
            assert!(outcome.failures >= 1);
        }
    }

    #[test]
    fn missing_primary_is_critical() {
        let mut desc = service("web", 1, 1, 0, RolloutState::Completed);
        desc.deployments.retain(|d| d.status != DeploymentStatus::Primary);
        let health = RolloutVerifier::default().evaluate(&desc, &[], NOW);
        assert!(health.checks.contains(&Check::MissingPrimaryDeployment));
        assert_eq!(health.outcome(), PollOutcome { failures: 1, critical: true });
    }

    #[test]
    fn task_age_threshold_is_inclusive_and_configurable() {
        let desc = service("web", 1, 1, 0, RolloutState::Completed);
        let tasks = vec![task("a", TD_V2, NOW - 30)];

        let strict = RolloutVerifier::new(VerifierConfig { min_task_age_secs: 60 });
        assert_eq!(strict.evaluate(&desc, &tasks, NOW).outcome().failures, 1);

        let relaxed = RolloutVerifier::new(VerifierConfig { min_task_age_secs: 30 });
        assert_eq!(relaxed.evaluate(&desc, &tasks, NOW).outcome().failures, 0);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let desc = service("web", 2, 1, 1, RolloutState::InProgress);
        let tasks = vec![task("a", TD_V1, NOW - 10)];
        let verifier = RolloutVerifier::default();
        assert_eq!(
            verifier.evaluate(&desc, &tasks, NOW),
            verifier.evaluate(&desc, &tasks, NOW)
        );
    }

    #[test]
    fn report_names_cluster_service_and_checks() {
        let desc = service("web", 2, 1, 0, RolloutState::InProgress);
        let tasks = vec![task("a", TD_V2, NOW - 10)];
        let report = RolloutVerifier::default().evaluate(&desc, &tasks, NOW).to_string();

        assert!(report.contains("🌎 Cluster: prod"));
        assert!(report.contains("🏓 Service: web"));
        assert!(report.contains("❌ Running task count: 1"));
        assert!(report.contains("✅ Pending task count: 0"));
        assert!(report.contains("is too young (10s, 60s minimum)"));
        assert!(report.contains("still in progress"));
        assert!(report.contains("2 check(s) failing"));
    }

    #[tokio::test]
    async fn check_service_fetches_tasks() {
        let fake = FakeEcs::new();
        let desc = service("web", 2, 2, 0, RolloutState::Completed);
        fake.set_tasks("web", healthy_tasks());

        let health = RolloutVerifier::default()
            .check_service(&fake, &desc, NOW)
            .await
            .unwrap();

        assert!(health.outcome().is_settled());
        assert_eq!(health.checks.len(), 2 + 2 * 2 + 1);
        assert_eq!(fake.calls(Operation::ListTasks), 1);
        assert_eq!(fake.calls(Operation::DescribeTasks), 1);
    }

    #[tokio::test]
    async fn no_tasks_means_no_describe() {
        let fake = FakeEcs::new();
        let tasks = fetch_tasks(&fake, "prod", "web").await.unwrap();
        assert!(tasks.is_empty());
        assert_eq!(fake.calls(Operation::DescribeTasks), 0);
    }
}
