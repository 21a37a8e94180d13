// ABOUTME: Pipeline run state markers for the type state pattern.
// ABOUTME: Running and Finished carry their own timing and outcome data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::error::RunFailure;

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Implemented by every run state marker.
pub trait RunState {
    fn status(&self) -> RunStatus;
}

/// Created by a trigger, no stage has run yet.
/// Available actions: `start()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Pending;

/// Stages are executing.
/// Available actions: `record()`, `finish()`
#[derive(Debug, Clone, Copy)]
pub struct Running {
    pub(crate) started_at: DateTime<Utc>,
}

/// Terminal: succeeded or failed. There is no transition out of this state.
#[derive(Debug, Clone)]
pub struct Finished {
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: DateTime<Utc>,
    pub(crate) failure: Option<RunFailure>,
}

impl RunState for Pending {
    fn status(&self) -> RunStatus {
        RunStatus::Pending
    }
}

impl RunState for Running {
    fn status(&self) -> RunStatus {
        RunStatus::Running
    }
}

impl RunState for Finished {
    fn status(&self) -> RunStatus {
        if self.failure.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        }
    }
}
