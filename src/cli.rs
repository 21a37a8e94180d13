// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Health-gated rollouts for services that must come up in order")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the configuration file (defaults to tandem.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter tandem.yml into the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the stage sequence a run would execute
    Plan,

    /// Run the pipeline once
    Run {
        /// Reason recorded on the run and passed to hooks
        #[arg(short, long)]
        reason: Option<String>,

        /// Break an existing run lock
        #[arg(short, long)]
        force: bool,
    },

    /// Run the pipeline on the configured schedule until interrupted
    Watch {
        /// Only run when the branch has new commits
        #[arg(long)]
        poll: bool,

        /// Break an existing run lock
        #[arg(short, long)]
        force: bool,
    },

    /// Probe one service's health check once
    Probe {
        /// Service name as listed in the config
        service: String,
    },
}
