// ABOUTME: Notification sink that runs hook scripts on run success or failure.
// ABOUTME: Discovers on-success and on-failure scripts and passes the notice via env vars.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{NotificationSink, OpError};
use crate::pipeline::{Notice, RunOutcome};

/// Hook execution points at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    OnSuccess,
    OnFailure,
}

impl HookPoint {
    /// Get the hook filename for this point.
    pub fn filename(&self) -> &'static str {
        match self {
            HookPoint::OnSuccess => "on-success",
            HookPoint::OnFailure => "on-failure",
        }
    }

    pub fn for_outcome(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Succeeded => HookPoint::OnSuccess,
            RunOutcome::Failed => HookPoint::OnFailure,
        }
    }
}

/// Result of running a hook.
#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Delivers run notices to hook scripts in a directory.
#[derive(Debug, Clone)]
pub struct HookNotifier {
    hooks_dir: PathBuf,
}

impl HookNotifier {
    pub fn new(hooks_dir: impl Into<PathBuf>) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
        }
    }

    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    /// Check if a hook exists for the given point.
    pub fn hook_exists(&self, point: HookPoint) -> bool {
        self.hook_path(point).is_file()
    }

    fn hook_path(&self, point: HookPoint) -> PathBuf {
        self.hooks_dir.join(point.filename())
    }

    /// Run a hook if it exists.
    ///
    /// Returns None if the hook doesn't exist, or Some(HookResult) if it was run.
    pub async fn run(&self, point: HookPoint, notice: &Notice) -> Option<HookResult> {
        let hook_path = self.hook_path(point);

        if !hook_path.is_file() {
            return None;
        }

        tracing::info!("Running {} hook: {}", point.filename(), hook_path.display());

        let output = Command::new(&hook_path)
            .envs(notice.to_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = HookResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if result.success {
                    tracing::info!("{} hook completed successfully", point.filename());
                } else {
                    tracing::warn!(
                        "{} hook failed with exit code {:?}",
                        point.filename(),
                        result.exit_code
                    );
                }

                Some(result)
            }
            Err(e) => {
                tracing::error!("Failed to execute {} hook: {}", point.filename(), e);
                Some(HookResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl NotificationSink for HookNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), OpError> {
        match notice.outcome {
            RunOutcome::Succeeded => tracing::info!("Run {} succeeded", notice.run_id),
            RunOutcome::Failed => {
                tracing::error!("Run {} failed: {}", notice.run_id, notice.detail)
            }
        }

        let point = HookPoint::for_outcome(notice.outcome);
        match self.run(point, notice).await {
            None => {
                tracing::debug!("No {} hook in {}", point.filename(), self.hooks_dir.display());
                Ok(())
            }
            Some(result) if result.success => Ok(()),
            Some(result) => Err(OpError::failed(format!(
                "{} hook failed (exit code {:?}): {}",
                point.filename(),
                result.exit_code,
                result.stderr.trim()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_point_filenames() {
        assert_eq!(HookPoint::OnSuccess.filename(), "on-success");
        assert_eq!(HookPoint::OnFailure.filename(), "on-failure");
    }

    #[test]
    fn outcome_selects_hook() {
        assert_eq!(HookPoint::for_outcome(RunOutcome::Succeeded), HookPoint::OnSuccess);
        assert_eq!(HookPoint::for_outcome(RunOutcome::Failed), HookPoint::OnFailure);
    }

    #[test]
    fn notifier_checks_hooks_dir() {
        let notifier = HookNotifier::new("/nonexistent");
        assert!(!notifier.hook_exists(HookPoint::OnFailure));
    }
}
