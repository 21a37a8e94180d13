// ABOUTME: Stage runner: executes a run's stages in order with a single abort path.
// ABOUTME: Emits exactly one terminal notification per run.

use std::sync::Arc;
use std::time::Instant;

use super::cancel::CancelToken;
use super::error::{RunFailure, StageError};
use super::gate::HealthGate;
use super::observer::{NoopObserver, RunObserver};
use super::run::{PipelineRun, RunReport, StageResult};
use super::stage::{Stage, StageAction};
use super::state::{Pending, Running};
use crate::diagnostics::{Diagnostics, Warning};
use crate::ops::{
    HealthProbe, ImageBuilder, NotificationSink, ServiceDeployer, Sleeper, SourceSync,
};

/// The external collaborators a run drives.
#[derive(Clone)]
pub struct Collaborators {
    pub sync: Arc<dyn SourceSync>,
    pub builder: Arc<dyn ImageBuilder>,
    pub deployer: Arc<dyn ServiceDeployer>,
    pub probe: Arc<dyn HealthProbe>,
    pub notifier: Arc<dyn NotificationSink>,
    pub sleeper: Arc<dyn Sleeper>,
}

pub struct StageRunner {
    ops: Collaborators,
    observer: Arc<dyn RunObserver>,
}

impl StageRunner {
    pub fn new(ops: Collaborators) -> Self {
        Self {
            ops,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.ops
    }

    /// Execute a run to completion and notify its outcome.
    ///
    /// The first failing stage aborts the run; later stages are never
    /// invoked. Exactly one notification is sent whatever the outcome. A
    /// notification failure is recorded in `diag` and does not change the
    /// run's status.
    pub async fn execute(
        &self,
        run: PipelineRun<Pending>,
        cancel: &CancelToken,
        diag: &mut Diagnostics,
    ) -> RunReport {
        let mut run = run.start();
        tracing::info!(
            "Run {} started ({}), {} stage(s)",
            run.id(),
            run.trigger().reason,
            run.stages().len()
        );
        self.observer.run_started(run.id(), run.trigger());

        let result = self.drive(&mut run, cancel).await;
        let run = run.finish(result);

        let notice = run.notice();
        if let Err(e) = self.ops.notifier.notify(&notice).await {
            diag.warn(Warning::notification(format!(
                "notification for run {} failed: {}",
                notice.run_id, e
            )));
        }

        let report = run.into_report();
        tracing::info!("Run {} {}", report.id, report.status);
        self.observer.run_finished(&report);
        report
    }

    async fn drive(
        &self,
        run: &mut PipelineRun<Running>,
        cancel: &CancelToken,
    ) -> Result<(), RunFailure> {
        for index in 0..run.stages().len() {
            let stage = &run.stages()[index];
            let name = stage.name().to_string();
            let started = Instant::now();

            let result = if cancel.is_cancelled() {
                Err(StageError::Cancelled)
            } else {
                tracing::info!("Stage {} started", name);
                self.observer.stage_started(stage);
                self.perform(stage, cancel).await
            };

            let (record, failure) = match result {
                Ok(detail) => (StageResult::Succeeded { detail }, None),
                Err(error) => (StageResult::Failed(error.clone()), Some(error)),
            };
            run.record(record, started.elapsed());
            if let Some(outcome) = run.outcomes().last() {
                self.observer.stage_finished(&run.stages()[index], outcome);
            }

            if let Some(error) = failure {
                tracing::warn!("Stage {} failed: {}", name, error);
                return Err(RunFailure::new(name, error));
            }
            tracing::info!("Stage {} succeeded", name);
        }
        Ok(())
    }

    /// Run one stage's action. Returns an optional detail on success.
    async fn perform(
        &self,
        stage: &Stage,
        cancel: &CancelToken,
    ) -> Result<Option<String>, StageError> {
        match stage.action() {
            StageAction::Sync { workspace, branch } => self
                .ops
                .sync
                .sync(workspace, branch)
                .await
                .map(|()| None)
                .map_err(|e| StageError::Sync(e.to_string())),
            StageAction::Build(service) => self
                .ops
                .builder
                .build(service)
                .await
                .map(|()| None)
                .map_err(|e| StageError::Build {
                    service: service.clone(),
                    reason: e.to_string(),
                }),
            StageAction::Deploy(service) => self
                .ops
                .deployer
                .deploy(service)
                .await
                .map(|()| None)
                .map_err(|e| StageError::Deploy {
                    service: service.clone(),
                    reason: e.to_string(),
                }),
            StageAction::HealthGate { service, policy } => {
                let gate = HealthGate::new(self.ops.probe.as_ref(), self.ops.sleeper.as_ref())
                    .with_observer(self.observer.as_ref());
                let report = gate.wait(service, policy, cancel).await?;
                Ok(Some(format!(
                    "healthy after {} attempt(s)",
                    report.attempts
                )))
            }
        }
    }
}
