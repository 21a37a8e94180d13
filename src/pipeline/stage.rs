// ABOUTME: Stage value objects: a name bound to one collaborator action.
// ABOUTME: Stages are immutable once a run starts.

use std::fmt;
use std::path::PathBuf;

use super::retry::RetryPolicy;
use crate::types::{BranchName, ServiceName};

/// The work a stage performs.
#[derive(Debug, Clone)]
pub enum StageAction {
    Sync {
        workspace: PathBuf,
        branch: BranchName,
    },
    Build(ServiceName),
    Deploy(ServiceName),
    HealthGate {
        service: ServiceName,
        policy: RetryPolicy,
    },
}

/// Category of a stage, used in names and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Sync,
    Build,
    Deploy,
    HealthGate,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Sync => "sync",
            StageKind::Build => "build",
            StageKind::Deploy => "deploy",
            StageKind::HealthGate => "health",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    action: StageAction,
}

impl Stage {
    pub fn sync(workspace: impl Into<PathBuf>, branch: BranchName) -> Self {
        Self {
            name: StageKind::Sync.to_string(),
            action: StageAction::Sync {
                workspace: workspace.into(),
                branch,
            },
        }
    }

    pub fn build(service: ServiceName) -> Self {
        Self {
            name: format!("{}:{}", StageKind::Build, service),
            action: StageAction::Build(service),
        }
    }

    pub fn deploy(service: ServiceName) -> Self {
        Self {
            name: format!("{}:{}", StageKind::Deploy, service),
            action: StageAction::Deploy(service),
        }
    }

    pub fn health_gate(service: ServiceName, policy: RetryPolicy) -> Self {
        Self {
            name: format!("{}:{}", StageKind::HealthGate, service),
            action: StageAction::HealthGate { service, policy },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &StageAction {
        &self.action
    }

    pub fn kind(&self) -> StageKind {
        match self.action {
            StageAction::Sync { .. } => StageKind::Sync,
            StageAction::Build(_) => StageKind::Build,
            StageAction::Deploy(_) => StageKind::Deploy,
            StageAction::HealthGate { .. } => StageKind::HealthGate,
        }
    }

    /// Retry policy, present only on health-gate stages.
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        match &self.action {
            StageAction::HealthGate { policy, .. } => Some(policy),
            _ => None,
        }
    }

    /// Human-readable description for progress output.
    pub fn describe(&self) -> String {
        match &self.action {
            StageAction::Sync { branch, .. } => format!("Syncing workspace to {branch}"),
            StageAction::Build(service) => format!("Building {service}"),
            StageAction::Deploy(service) => format!("Deploying {service}"),
            StageAction::HealthGate { service, policy } => format!(
                "Waiting for {service} to report healthy (up to {} attempts)",
                policy.max_attempts()
            ),
        }
    }
}
