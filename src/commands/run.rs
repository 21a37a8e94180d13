// ABOUTME: Run command implementation.
// ABOUTME: Executes one manual run; Ctrl-C cancels at the next stage boundary.

use std::sync::Arc;
use tandem::config::Config;
use tandem::diagnostics::Diagnostics;
use tandem::error::{Error, Result};
use tandem::output::Output;
use tandem::pipeline::{CancelToken, Trigger};

use super::collaborators::dispatcher;

pub async fn run(
    config: Config,
    reason: Option<String>,
    force: bool,
    output: Arc<Output>,
) -> Result<()> {
    let dispatcher = dispatcher(&config, force, output.clone())?;
    let mut diag = Diagnostics::default();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let result = dispatcher
        .trigger(Trigger::manual(reason), &cancel, &mut diag)
        .await;
    interrupt.abort();

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let report = result?;
    output.report(&report);

    match report.failure {
        None => Ok(()),
        Some(failure) => Err(Error::RunFailed {
            id: report.id.to_string(),
            stage: failure.stage,
        }),
    }
}
