// ABOUTME: Error types for collaborator operations.
// ABOUTME: Shell command failures use the SNAFU pattern with context selectors.

use snafu::Snafu;

/// Failure running a shell command.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CommandError {
    #[snafu(display("failed to spawn `{command}`: {source}"))]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` exited with {status}{}", stderr_suffix(stderr)))]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Error returned by a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{0}")]
    Failed(String),
}

impl OpError {
    pub fn failed(message: impl Into<String>) -> Self {
        OpError::Failed(message.into())
    }
}
