// ABOUTME: One execution of the stage sequence, parameterized by lifecycle state.
// ABOUTME: Also defines the trigger, per-stage outcomes, the notice and the final report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use super::error::{RunFailure, StageError, StageErrorKind};
use super::stage::Stage;
use super::state::{Finished, Pending, RunState, RunStatus, Running};
use crate::types::RunId;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    Manual,
    Schedule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub source: TriggerSource,
    pub reason: String,
}

impl Trigger {
    pub fn manual(reason: Option<String>) -> Self {
        Self {
            source: TriggerSource::Manual,
            reason: reason.unwrap_or_else(|| "manual".to_string()),
        }
    }

    pub fn scheduled() -> Self {
        Self {
            source: TriggerSource::Schedule,
            reason: "schedule".to_string(),
        }
    }
}

/// Recorded result of a stage that was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    Succeeded { detail: Option<String> },
    Failed(StageError),
}

#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: String,
    pub result: StageResult,
    pub elapsed: Duration,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, StageResult::Succeeded { .. })
    }
}

/// A pipeline run in state `S`.
#[derive(Debug)]
pub struct PipelineRun<S> {
    id: RunId,
    trigger: Trigger,
    stages: Vec<Stage>,
    outcomes: Vec<StageOutcome>,
    state: S,
}

impl<S: RunState> PipelineRun<S> {
    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn status(&self) -> RunStatus {
        self.state.status()
    }
}

impl PipelineRun<Pending> {
    pub fn new(trigger: Trigger, stages: Vec<Stage>) -> Self {
        Self {
            id: RunId::generate(),
            trigger,
            stages,
            outcomes: Vec::new(),
            state: Pending,
        }
    }

    #[must_use = "run state must be used"]
    pub fn start(self) -> PipelineRun<Running> {
        PipelineRun {
            id: self.id,
            trigger: self.trigger,
            stages: self.stages,
            outcomes: self.outcomes,
            state: Running {
                started_at: Utc::now(),
            },
        }
    }
}

impl PipelineRun<Running> {
    /// The next stage without a recorded outcome.
    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.outcomes.len())
    }

    /// Record the outcome of the current stage. Each stage is recorded once, in order.
    pub(crate) fn record(&mut self, result: StageResult, elapsed: Duration) {
        let Some(stage) = self.current_stage() else {
            tracing::warn!("outcome recorded past the last stage of run {}", self.id);
            return;
        };
        let outcome = StageOutcome {
            stage: stage.name().to_string(),
            result,
            elapsed,
        };
        self.outcomes.push(outcome);
    }

    #[must_use = "run state must be used"]
    pub fn finish(self, result: Result<(), RunFailure>) -> PipelineRun<Finished> {
        PipelineRun {
            id: self.id,
            trigger: self.trigger,
            stages: self.stages,
            outcomes: self.outcomes,
            state: Finished {
                started_at: self.state.started_at,
                finished_at: Utc::now(),
                failure: result.err(),
            },
        }
    }
}

impl PipelineRun<Finished> {
    pub fn failure(&self) -> Option<&RunFailure> {
        self.state.failure.as_ref()
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.state.failure.is_some() {
            RunOutcome::Failed
        } else {
            RunOutcome::Succeeded
        }
    }

    /// The single terminal signal for this run.
    pub fn notice(&self) -> Notice {
        let detail = match &self.state.failure {
            Some(failure) => failure.to_string(),
            None => format!("all {} stage(s) succeeded", self.stages.len()),
        };
        Notice {
            run_id: self.id.clone(),
            reason: self.trigger.reason.clone(),
            outcome: self.outcome(),
            detail,
            failed_stage: self.state.failure.as_ref().map(|f| f.stage.clone()),
            error_kind: self.state.failure.as_ref().map(RunFailure::kind),
        }
    }

    /// Consume the run into its report.
    pub fn into_report(self) -> RunReport {
        let mut recorded = self.outcomes.into_iter();
        let stages = self
            .stages
            .iter()
            .map(|stage| match recorded.next() {
                Some(outcome) => StageReport::from_outcome(outcome),
                None => StageReport {
                    name: stage.name().to_string(),
                    status: StageStatus::Skipped,
                    detail: None,
                    elapsed_ms: 0,
                },
            })
            .collect();

        let status = self.state.status();
        RunReport {
            id: self.id,
            reason: self.trigger.reason,
            trigger: self.trigger.source,
            status,
            started_at: self.state.started_at,
            finished_at: self.state.finished_at,
            stages,
            failure: self.state.failure.map(|f| FailureReport {
                stage: f.stage.clone(),
                kind: f.kind(),
                detail: f.error.to_string(),
            }),
        }
    }
}

/// Terminal outcome passed to the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Failed => "failed",
        }
    }
}

/// Payload delivered to the notification sink once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub run_id: RunId,
    pub reason: String,
    pub outcome: RunOutcome,
    pub detail: String,
    pub failed_stage: Option<String>,
    pub error_kind: Option<StageErrorKind>,
}

impl Notice {
    /// Convert to environment variables for notification hooks.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("TANDEM_RUN_ID".to_string(), self.run_id.to_string());
        env.insert("TANDEM_REASON".to_string(), self.reason.clone());
        env.insert("TANDEM_OUTCOME".to_string(), self.outcome.as_str().to_string());
        env.insert("TANDEM_DETAIL".to_string(), self.detail.clone());
        if let Some(ref stage) = self.failed_stage {
            env.insert("TANDEM_STAGE".to_string(), stage.clone());
        }
        if let Some(kind) = self.error_kind {
            env.insert("TANDEM_ERROR_KIND".to_string(), kind.to_string());
        }
        env
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded,
    Failed,
    /// Never reached because an earlier stage failed.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub name: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

impl StageReport {
    fn from_outcome(outcome: StageOutcome) -> Self {
        let (status, detail) = match outcome.result {
            StageResult::Succeeded { detail } => (StageStatus::Succeeded, detail),
            StageResult::Failed(err) => (StageStatus::Failed, Some(err.to_string())),
        };
        Self {
            name: outcome.stage,
            status,
            detail,
            elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub stage: String,
    pub kind: StageErrorKind,
    pub detail: String,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub id: RunId,
    pub reason: String,
    pub trigger: TriggerSource,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.name == name)
    }
}
