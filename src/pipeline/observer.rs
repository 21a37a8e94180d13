// ABOUTME: Progress callbacks invoked by the stage runner.
// ABOUTME: The CLI output implements it to print progress; tests use it to record events.

use super::retry::HealthObservation;
use super::run::{RunReport, StageOutcome, Trigger};
use super::stage::Stage;
use crate::types::{RunId, ServiceName};

/// Receives progress events for a run. All methods default to no-ops.
pub trait RunObserver: Send + Sync {
    fn run_started(&self, _id: &RunId, _trigger: &Trigger) {}

    fn stage_started(&self, _stage: &Stage) {}

    fn gate_attempt(
        &self,
        _service: &ServiceName,
        _attempt: u32,
        _max_attempts: u32,
        _observation: &HealthObservation,
    ) {
    }

    fn stage_finished(&self, _stage: &Stage, _outcome: &StageOutcome) {}

    fn run_finished(&self, _report: &RunReport) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
