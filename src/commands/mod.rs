// ABOUTME: Command module aggregator for the tandem CLI.
// ABOUTME: Re-exports plan, run, watch and probe command handlers.

mod collaborators;
mod plan;
mod probe;
mod run;
mod watch;

pub use plan::plan;
pub use probe::probe;
pub use run::run;
pub use watch::watch;
