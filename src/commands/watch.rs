// ABOUTME: Watch command implementation.
// ABOUTME: Triggers runs on the configured schedule until Ctrl-C.

use std::sync::Arc;
use tandem::config::Config;
use tandem::diagnostics::Diagnostics;
use tandem::error::Result;
use tandem::output::Output;
use tandem::pipeline::{CancelToken, WatchSettings, watch as watch_loop};

use super::collaborators::dispatcher;

pub async fn watch(config: Config, poll: bool, force: bool, output: Arc<Output>) -> Result<()> {
    let dispatcher = dispatcher(&config, force, output.clone())?;
    let settings = WatchSettings {
        interval: config.schedule.interval,
        poll,
    };
    let mut diag = Diagnostics::default();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping watch");
            on_interrupt.cancel();
        }
    });

    output.progress(&format!(
        "Watching {} every {}",
        config.project,
        humantime_serde::re::humantime::format_duration(settings.interval)
    ));

    let summary = watch_loop(&dispatcher, settings, &cancel, &mut diag, |report| {
        output.report(report);
    })
    .await;

    for warning in diag.drain() {
        output.warning(&warning.message);
    }

    output.success(&format!(
        "Stopped after {} run(s), {} failed, {} rejected",
        summary.runs, summary.failed, summary.rejected
    ));
    Ok(())
}
