// ABOUTME: Entry point for the tandem CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tandem::config::{self, Config};
use tandem::error::Result;
use tandem::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("tandem=debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Arc::new(Output::new(mode));

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Arc<Output>) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { force } => {
            config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Plan => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::plan(&config, output);
            Ok(())
        }
        Commands::Run { reason, force } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::run(config, reason, force, output.clone()).await
        }
        Commands::Watch { poll, force } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::watch(config, poll, force, output.clone()).await
        }
        Commands::Probe { service } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::probe(&config, &service, output).await
        }
    }
}

fn load_config(path: Option<&Path>, cwd: &Path) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(cwd),
    }
}
