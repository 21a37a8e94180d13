// ABOUTME: Integration tests for the health gate's bounded polling.
// ABOUTME: Covers attempt limits, waits between attempts, and cancellation.

mod support;

use proptest::prelude::*;
use std::num::NonZeroU32;
use std::time::Duration;
use support::{PendingSleeper, RecordingSleeper, ScriptedProbe, service};
use tandem::pipeline::{CancelToken, HealthGate, HealthStatus, RetryPolicy, StageError};

fn policy(max_attempts: u32, interval_secs: u64) -> RetryPolicy {
    RetryPolicy::new(
        NonZeroU32::new(max_attempts).unwrap(),
        Duration::from_secs(interval_secs),
    )
}

#[tokio::test]
async fn passes_after_three_unhealthy_observations() {
    support::init_tracing();
    let probe = ScriptedProbe::new([HealthStatus::Unhealthy; 3], HealthStatus::Healthy);
    let sleeper = RecordingSleeper::default();

    let report = HealthGate::new(&probe, &sleeper)
        .wait(&service("backend"), &policy(10, 15), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.attempts, 4);
    assert_eq!(report.waited, Duration::from_secs(45));
    assert_eq!(sleeper.count(), 3);
    assert_eq!(probe.log.count("probe:backend"), 4);
}

#[tokio::test]
async fn healthy_first_time_does_not_wait() {
    let probe = ScriptedProbe::always(HealthStatus::Healthy);
    let sleeper = RecordingSleeper::default();

    let report = HealthGate::new(&probe, &sleeper)
        .wait(&service("backend"), &policy(10, 15), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.attempts, 1);
    assert_eq!(sleeper.count(), 0);
}

#[tokio::test]
async fn never_healthy_exhausts_after_max_attempts() {
    let probe = ScriptedProbe::always(HealthStatus::Unhealthy);
    let sleeper = RecordingSleeper::default();

    let err = HealthGate::new(&probe, &sleeper)
        .wait(&service("backend"), &policy(10, 15), &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StageError::HealthGateExhausted {
            service: service("backend"),
            attempts: 10,
            last: HealthStatus::Unhealthy,
        }
    );
    assert_eq!(probe.log.count("probe:"), 10);
    assert_eq!(sleeper.count(), 9);
    assert_eq!(sleeper.total(), Duration::from_secs(135));
}

#[tokio::test]
async fn unreachable_consumes_an_attempt() {
    let probe = ScriptedProbe::new(
        [HealthStatus::Unreachable, HealthStatus::Unreachable],
        HealthStatus::Healthy,
    );
    let sleeper = RecordingSleeper::default();

    let err = HealthGate::new(&probe, &sleeper)
        .wait(&service("backend"), &policy(2, 1), &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StageError::HealthGateExhausted {
            attempts: 2,
            last: HealthStatus::Unreachable,
            ..
        }
    ));
}

#[tokio::test]
async fn custom_predicate_decides_success() {
    let probe = ScriptedProbe::always(HealthStatus::Unhealthy);
    let sleeper = RecordingSleeper::default();
    let lenient = policy(3, 1).with_predicate(|obs| obs.status != HealthStatus::Unreachable);

    let report = HealthGate::new(&probe, &sleeper)
        .wait(&service("backend"), &lenient, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.attempts, 1);
}

#[tokio::test]
async fn cancelled_before_first_attempt_never_probes() {
    let probe = ScriptedProbe::always(HealthStatus::Healthy);
    let sleeper = RecordingSleeper::default();
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = HealthGate::new(&probe, &sleeper)
        .wait(&service("backend"), &policy(10, 15), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, StageError::Cancelled);
    assert_eq!(probe.log.count("probe:"), 0);
}

#[tokio::test]
async fn cancel_interrupts_wait_between_attempts() {
    let probe = ScriptedProbe::always(HealthStatus::Unhealthy);
    let cancel = CancelToken::new();
    let trigger = cancel.clone();

    let gate = HealthGate::new(&probe, &PendingSleeper);
    let name = service("backend");
    let policy = policy(10, 15);
    let (result, ()) = tokio::join!(gate.wait(&name, &policy, &cancel), async move {
        tokio::task::yield_now().await;
        trigger.cancel();
    });

    assert_eq!(result.unwrap_err(), StageError::Cancelled);
    assert_eq!(probe.log.count("probe:"), 1);
}

proptest! {
    #[test]
    fn gate_never_exceeds_attempt_budget(
        max_attempts in 1u32..20,
        healthy_at in proptest::option::of(1u32..25),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let unhealthy = healthy_at.map(|k| k - 1).unwrap_or(max_attempts + 5);
        let probe = ScriptedProbe::new(
            std::iter::repeat_n(HealthStatus::Unhealthy, unhealthy as usize),
            HealthStatus::Healthy,
        );
        let sleeper = RecordingSleeper::default();

        let result = rt.block_on(
            HealthGate::new(&probe, &sleeper).wait(&service("svc"), &policy(max_attempts, 2), &CancelToken::new()),
        );

        let probes = probe.log.count("probe:") as u32;
        prop_assert!(probes <= max_attempts);
        prop_assert!(sleeper.count() as u32 <= max_attempts - 1);
        prop_assert_eq!(sleeper.count() as u32, probes - 1);

        match healthy_at {
            Some(k) if k <= max_attempts => {
                let report = result.unwrap();
                prop_assert_eq!(report.attempts, k);
                prop_assert_eq!(report.waited, Duration::from_secs(2 * u64::from(k - 1)));
            }
            _ => {
                let is_exhausted = matches!(result, Err(StageError::HealthGateExhausted { .. }));
                prop_assert!(is_exhausted);
                prop_assert_eq!(probes, max_attempts);
            }
        }
    }
}
