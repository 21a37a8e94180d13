// ABOUTME: Collaborator traits the pipeline drives, and their production implementations.
// ABOUTME: Defines SourceSync, ImageBuilder, ServiceDeployer, HealthProbe, NotificationSink, Sleeper.

mod error;
mod notify;
mod probe;
mod shell;
mod sleep;

pub use error::{CommandError, OpError};
pub use notify::{HookNotifier, HookPoint, HookResult};
pub use probe::{CommandProbe, ConfiguredProbe, HttpProbe, ProbeError, TargetProbe};
pub use shell::{CommandOutput, ShellCommands};
pub use sleep::{Sleeper, TokioSleeper};

use async_trait::async_trait;
use std::path::Path;

use crate::pipeline::{HealthStatus, Notice};
use crate::types::{BranchName, ServiceName};

/// Brings a workspace to the latest revision of a branch.
#[async_trait]
pub trait SourceSync: Send + Sync {
    async fn sync(&self, workspace: &Path, branch: &BranchName) -> Result<(), OpError>;

    /// Whether the branch has revisions the workspace lacks.
    async fn has_update(&self, _workspace: &Path, _branch: &BranchName) -> Result<bool, OpError> {
        Ok(true)
    }
}

/// Produces a deployable artifact for a service from the workspace.
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    async fn build(&self, service: &ServiceName) -> Result<(), OpError>;
}

/// Starts or restarts one service. Must be idempotent and leave other services alone.
#[async_trait]
pub trait ServiceDeployer: Send + Sync {
    async fn deploy(&self, service: &ServiceName) -> Result<(), OpError>;
}

/// Reads a service's health signal. Must be side-effect free.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, service: &ServiceName) -> HealthStatus;
}

/// Receives the terminal signal of each run.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<(), OpError>;
}
