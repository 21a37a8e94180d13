// ABOUTME: Scheduled trigger loop.
// ABOUTME: Fires a trigger every interval until cancelled, optionally only when the branch moved.

use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::cancel::CancelToken;
use super::dispatch::Dispatcher;
use super::run::{RunReport, Trigger};
use crate::diagnostics::{Diagnostics, Warning};

#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    /// Must be non-zero; config validation rejects `0s`.
    pub interval: Duration,
    /// Only trigger when the source reports an update.
    pub poll: bool,
}

/// Counts from a finished watch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub runs: usize,
    pub failed: usize,
    pub rejected: usize,
    pub idle_ticks: usize,
}

/// Trigger runs on `settings.interval` until `cancel` fires.
///
/// The first tick fires immediately. Ticks missed while a run is in
/// progress are skipped rather than replayed. Cancelling stops the loop and
/// is observed by the in-flight run at its next boundary.
pub async fn watch<F>(
    dispatcher: &Dispatcher,
    settings: WatchSettings,
    cancel: &CancelToken,
    diag: &mut Diagnostics,
    mut on_report: F,
) -> WatchSummary
where
    F: FnMut(&RunReport),
{
    let mut summary = WatchSummary::default();
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if settings.poll {
            match dispatcher.has_update().await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("No update on source branch");
                    summary.idle_ticks += 1;
                    continue;
                }
                Err(e) => {
                    diag.warn(Warning::trigger_rejected(format!("update check failed: {e}")));
                    summary.idle_ticks += 1;
                    continue;
                }
            }
        }

        match dispatcher.trigger(Trigger::scheduled(), cancel, diag).await {
            Ok(report) => {
                summary.runs += 1;
                if !report.succeeded() {
                    summary.failed += 1;
                }
                on_report(&report);
            }
            Err(e) => {
                summary.rejected += 1;
                diag.warn(Warning::trigger_rejected(format!("scheduled trigger rejected: {e}")));
            }
        }
    }

    summary
}
