// ABOUTME: Error types for pipeline stages and runs.
// ABOUTME: Every stage failure maps to one error kind carried into the run's notification.

use serde::Serialize;
use std::fmt;

use super::retry::HealthStatus;
use crate::types::ServiceName;

/// Why a stage failed. All variants are terminal for the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("source sync failed: {0}")]
    Sync(String),

    #[error("build of {service} failed: {reason}")]
    Build { service: ServiceName, reason: String },

    #[error("deploy of {service} failed: {reason}")]
    Deploy { service: ServiceName, reason: String },

    #[error("{service} not healthy after {attempts} attempt(s), last observed {last}")]
    HealthGateExhausted {
        service: ServiceName,
        attempts: u32,
        last: HealthStatus,
    },

    #[error("run cancelled")]
    Cancelled,
}

/// Error kind for programmatic handling and notification payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageErrorKind {
    SyncError,
    BuildError,
    DeployError,
    HealthGateExhausted,
    Cancelled,
}

impl StageError {
    pub fn kind(&self) -> StageErrorKind {
        match self {
            StageError::Sync(_) => StageErrorKind::SyncError,
            StageError::Build { .. } => StageErrorKind::BuildError,
            StageError::Deploy { .. } => StageErrorKind::DeployError,
            StageError::HealthGateExhausted { .. } => StageErrorKind::HealthGateExhausted,
            StageError::Cancelled => StageErrorKind::Cancelled,
        }
    }
}

impl fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageErrorKind::SyncError => "SyncError",
            StageErrorKind::BuildError => "BuildError",
            StageErrorKind::DeployError => "DeployError",
            StageErrorKind::HealthGateExhausted => "HealthGateExhausted",
            StageErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// The failure that ended a run: which stage, and its error verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stage '{stage}' failed with {}: {error}", .error.kind())]
pub struct RunFailure {
    pub stage: String,
    pub error: StageError,
}

impl RunFailure {
    pub fn new(stage: impl Into<String>, error: StageError) -> Self {
        Self {
            stage: stage.into(),
            error,
        }
    }

    pub fn kind(&self) -> StageErrorKind {
        self.error.kind()
    }
}

/// Errors that prevent a trigger from starting a run.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("a run is already in progress")]
    Busy,

    #[error(transparent)]
    Lock(#[from] super::lock::LockError),
}
