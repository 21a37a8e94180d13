// ABOUTME: Health gate: bounded, fixed-interval polling of a service's health signal.
// ABOUTME: Blocks progression until the retry policy is satisfied or attempts run out.

use std::time::Duration;

use super::cancel::CancelToken;
use super::error::StageError;
use super::observer::{NoopObserver, RunObserver};
use super::retry::{HealthObservation, HealthStatus, RetryPolicy};
use crate::ops::{HealthProbe, Sleeper};
use crate::types::ServiceName;

/// Result of a gate that passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateReport {
    /// Attempts made, counting from 1.
    pub attempts: u32,
    /// Total time spent waiting between attempts.
    pub waited: Duration,
}

pub struct HealthGate<'a> {
    probe: &'a dyn HealthProbe,
    sleeper: &'a dyn Sleeper,
    observer: &'a dyn RunObserver,
}

impl<'a> HealthGate<'a> {
    pub fn new(probe: &'a dyn HealthProbe, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            probe,
            sleeper,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Poll `service` until `policy` is satisfied.
    ///
    /// Makes at most `max_attempts` observations with one `interval` wait
    /// between consecutive attempts. Unreachable and unhealthy observations
    /// both consume an attempt. Cancellation is checked before every attempt
    /// and interrupts the wait.
    ///
    /// # Errors
    ///
    /// `StageError::HealthGateExhausted` when every attempt fails the policy,
    /// `StageError::Cancelled` when the token fires first.
    pub async fn wait(
        &self,
        service: &ServiceName,
        policy: &RetryPolicy,
        cancel: &CancelToken,
    ) -> Result<GateReport, StageError> {
        let max_attempts = policy.max_attempts().get();
        let mut waited = Duration::ZERO;
        let mut last = HealthStatus::Unreachable;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(StageError::Cancelled);
            }

            let observation = HealthObservation::now(self.probe.probe(service).await);
            tracing::debug!(
                "{} health attempt {}/{}: {}",
                service,
                attempt,
                max_attempts,
                observation.status
            );
            self.observer
                .gate_attempt(service, attempt, max_attempts, &observation);

            if policy.is_satisfied(&observation) {
                return Ok(GateReport { attempts: attempt, waited });
            }
            last = observation.status;

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(StageError::Cancelled),
                    _ = self.sleeper.sleep(policy.interval()) => waited += policy.interval(),
                }
            }
        }

        Err(StageError::HealthGateExhausted {
            service: service.clone(),
            attempts: max_attempts,
            last,
        })
    }
}
