// ABOUTME: Health observations and the bounded retry policy that judges them.
// ABOUTME: The success predicate is a pure function so gates can be tested without a service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Health signal reported by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    /// The target could not be queried at all.
    Unreachable,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unreachable => "unreachable",
        };
        f.write_str(s)
    }
}

/// A point-in-time read of a service's health signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthObservation {
    pub status: HealthStatus,
    pub observed_at: DateTime<Utc>,
}

impl HealthObservation {
    pub fn new(status: HealthStatus, observed_at: DateTime<Utc>) -> Self {
        Self {
            status,
            observed_at,
        }
    }

    /// Stamp a status with the current time.
    pub fn now(status: HealthStatus) -> Self {
        Self::new(status, Utc::now())
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

pub type SuccessPredicate = Arc<dyn Fn(&HealthObservation) -> bool + Send + Sync>;

/// Bounded-attempt, fixed-interval retry configuration.
///
/// With `max_attempts = N` a gate makes at most N observations and waits
/// `interval` between consecutive ones, never after the last.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    interval: Duration,
    predicate: SuccessPredicate,
}

impl RetryPolicy {
    /// Policy that succeeds on the first `healthy` observation.
    pub fn new(max_attempts: NonZeroU32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            predicate: Arc::new(HealthObservation::is_healthy),
        }
    }

    /// Replace the success predicate.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&HealthObservation) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    pub fn max_attempts(&self) -> NonZeroU32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_satisfied(&self, observation: &HealthObservation) -> bool {
        (self.predicate)(observation)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(NonZeroU32::new(3).unwrap(), Duration::from_secs(1))
    }

    #[test]
    fn default_predicate_accepts_only_healthy() {
        let p = policy();
        assert!(p.is_satisfied(&HealthObservation::now(HealthStatus::Healthy)));
        assert!(!p.is_satisfied(&HealthObservation::now(HealthStatus::Unhealthy)));
        assert!(!p.is_satisfied(&HealthObservation::now(HealthStatus::Unreachable)));
    }

    #[test]
    fn custom_predicate_replaces_default() {
        let p = policy().with_predicate(|o| o.status != HealthStatus::Unreachable);
        assert!(p.is_satisfied(&HealthObservation::now(HealthStatus::Unhealthy)));
        assert!(!p.is_satisfied(&HealthObservation::now(HealthStatus::Unreachable)));
    }

    #[test]
    fn debug_omits_predicate() {
        let debug = format!("{:?}", policy());
        assert!(debug.contains("max_attempts: 3"));
        assert!(debug.contains(".."));
    }
}
