// ABOUTME: Shared helper wiring the production collaborators from configuration.
// ABOUTME: Used by the run and watch commands to build a dispatcher.

use std::sync::Arc;
use tandem::config::Config;
use tandem::error::Result;
use tandem::ops::{ConfiguredProbe, HookNotifier, ShellCommands, TokioSleeper};
use tandem::pipeline::{Collaborators, Dispatcher, LockSettings, RunObserver, StageRunner, plan};

/// Build a dispatcher for `config` that reports progress to `observer`.
///
/// Shell commands cover sync, build and deploy; health checks and hooks
/// come from the per-service and hooks_dir settings.
pub fn dispatcher(
    config: &Config,
    force: bool,
    observer: Arc<dyn RunObserver>,
) -> Result<Dispatcher> {
    let shell = Arc::new(ShellCommands::from_config(config)?);
    let ops = Collaborators {
        sync: shell.clone(),
        builder: shell.clone(),
        deployer: shell,
        probe: Arc::new(ConfiguredProbe::from_config(config)?),
        notifier: Arc::new(HookNotifier::new(config.hooks_dir())),
        sleeper: Arc::new(TokioSleeper),
    };

    let runner = StageRunner::new(ops).with_observer(observer);
    Ok(Dispatcher::new(runner, plan(config)).with_lock(LockSettings {
        state_dir: config.state_dir(),
        project: config.project.clone(),
        force,
    }))
}
