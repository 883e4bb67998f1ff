//! Shared types used across ecsctl crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an ECS service tracked during discovery and waiting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    pub service_arn: String,
    pub service_name: String,
    pub cluster_name: String,
}

impl ServiceRef {
    pub fn new(service_arn: &str, service_name: &str, cluster_name: &str) -> Self {
        Self {
            service_arn: service_arn.to_string(),
            service_name: service_name.to_string(),
            cluster_name: cluster_name.to_string(),
        }
    }
}

/// Deployment status as reported by ECS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Primary,
    Active,
    Inactive,
    /// Any status this version does not know about.
    #[serde(untagged)]
    Other(String),
}

impl DeploymentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "PRIMARY" => Self::Primary,
            "ACTIVE" => Self::Active,
            "INACTIVE" => Self::Inactive,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Rollout lifecycle of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloutState {
    InProgress,
    Completed,
    Failed,
    #[serde(untagged)]
    Other(String),
}

impl RolloutState {
    pub fn parse(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for RolloutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One deployment record of a service.
///
/// Deployments created without a rollout-aware controller carry no
/// rollout state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub status: DeploymentStatus,
    pub rollout_state: Option<RolloutState>,
}

/// Snapshot of a service's live state at poll time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescription {
    pub service_arn: String,
    pub service_name: String,
    pub cluster_name: String,
    /// `ACTIVE`, `DRAINING` or `INACTIVE`.
    #[serde(default)]
    pub status: String,
    pub task_definition: String,
    pub desired_count: i32,
    pub running_count: i32,
    pub pending_count: i32,
    pub deployments: Vec<Deployment>,
}

impl ServiceDescription {
    /// The deployment currently targeted by the rollout, if any.
    pub fn primary_deployment(&self) -> Option<&Deployment> {
        self.deployments
            .iter()
            .find(|d| d.status == DeploymentStatus::Primary)
    }

    /// Deleted services stay describable as `INACTIVE` for a while.
    pub fn is_active(&self) -> bool {
        self.status != "INACTIVE"
    }

    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef::new(&self.service_arn, &self.service_name, &self.cluster_name)
    }
}

/// A running task observed at poll time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub task_arn: String,
    pub task_definition_arn: String,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: i64,
}

impl TaskSnapshot {
    /// Whole seconds elapsed between creation and `now`.
    pub fn age_secs(&self, now: i64) -> i64 {
        now - self.created_at
    }
}

/// Result of evaluating one service in one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollOutcome {
    pub failures: u32,
    pub critical: bool,
}

impl PollOutcome {
    pub fn is_settled(&self) -> bool {
        self.failures == 0 && !self.critical
    }
}

impl std::ops::Add for PollOutcome {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            failures: self.failures + rhs.failures,
            critical: self.critical || rhs.critical,
        }
    }
}

impl std::iter::Sum for PollOutcome {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, o| acc + o)
    }
}
