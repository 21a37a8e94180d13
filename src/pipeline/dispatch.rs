// ABOUTME: Serializes triggers into runs: one run at a time, overlapping triggers rejected.
// ABOUTME: Optionally holds a cross-process run lock for the duration of each run.

use std::path::PathBuf;
use tokio::sync::Mutex;

use super::cancel::CancelToken;
use super::error::DispatchError;
use super::lock::RunLock;
use super::run::{PipelineRun, RunReport, Trigger};
use super::runner::StageRunner;
use super::stage::{Stage, StageAction};
use crate::diagnostics::{Diagnostics, Warning};
use crate::ops::OpError;
use crate::types::ServiceName;

/// Where and how to take the cross-process run lock.
#[derive(Debug, Clone)]
pub struct LockSettings {
    pub state_dir: PathBuf,
    pub project: ServiceName,
    pub force: bool,
}

pub struct Dispatcher {
    runner: StageRunner,
    stages: Vec<Stage>,
    slot: Mutex<()>,
    lock: Option<LockSettings>,
}

impl Dispatcher {
    pub fn new(runner: StageRunner, stages: Vec<Stage>) -> Self {
        Self {
            runner,
            stages,
            slot: Mutex::new(()),
            lock: None,
        }
    }

    pub fn with_lock(mut self, settings: LockSettings) -> Self {
        self.lock = Some(settings);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Start a new run from the first stage.
    ///
    /// # Errors
    ///
    /// `DispatchError::Busy` if a run is in progress in this process,
    /// `DispatchError::Lock` if another process holds the run lock. A
    /// rejected trigger creates no run and sends no notification.
    pub async fn trigger(
        &self,
        trigger: Trigger,
        cancel: &CancelToken,
        diag: &mut Diagnostics,
    ) -> Result<RunReport, DispatchError> {
        let Ok(_slot) = self.slot.try_lock() else {
            tracing::warn!("Rejecting trigger ({}): run in progress", trigger.reason);
            return Err(DispatchError::Busy);
        };

        let lock = match &self.lock {
            Some(settings) => Some(RunLock::acquire(
                &settings.state_dir,
                &settings.project,
                settings.force,
            )?),
            None => None,
        };
        if let Some(lock) = &lock {
            tracing::debug!("Holding run lock {}", lock.path().display());
        }

        let run = PipelineRun::new(trigger, self.stages.clone());
        let report = self.runner.execute(run, cancel, diag).await;

        if let Some(lock) = lock {
            let path = lock.path().display().to_string();
            if let Err(e) = lock.release() {
                diag.warn(Warning::lock_release(format!(
                    "failed to release run lock {path}: {e}"
                )));
            }
        }

        Ok(report)
    }

    /// Ask the source sync whether the branch has moved. True when there is no sync stage.
    pub async fn has_update(&self) -> Result<bool, OpError> {
        let sync = self.stages.iter().find_map(|stage| match stage.action() {
            StageAction::Sync { workspace, branch } => Some((workspace, branch)),
            _ => None,
        });
        match sync {
            Some((workspace, branch)) => {
                self.runner
                    .collaborators()
                    .sync
                    .has_update(workspace, branch)
                    .await
            }
            None => Ok(true),
        }
    }
}
