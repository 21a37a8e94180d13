// ABOUTME: Shell-template implementation of sync, build and deploy.
// ABOUTME: Runs configured commands with `sh -c` inside the workspace.

use async_trait::async_trait;
use snafu::ResultExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::error::{CommandError, ExitSnafu, OpError, SpawnSnafu};
use super::{ImageBuilder, ServiceDeployer, SourceSync};
use crate::config::{CommandsConfig, Config, resolve_env_map};
use crate::types::{BranchName, ServiceName};

/// Longest stderr excerpt kept in an error.
const STDERR_TAIL: usize = 2000;

/// Captured output of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs the configured command templates for every external collaborator.
#[derive(Debug, Clone)]
pub struct ShellCommands {
    workspace: PathBuf,
    branch: BranchName,
    templates: CommandsConfig,
    env: HashMap<String, String>,
}

impl ShellCommands {
    pub fn new(
        workspace: impl Into<PathBuf>,
        branch: BranchName,
        templates: CommandsConfig,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            branch,
            templates,
            env,
        }
    }

    /// Build from config, resolving env interpolation up front.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        Ok(Self::new(
            config.workspace(),
            config.branch.clone(),
            config.commands.clone(),
            resolve_env_map(&config.env)?,
        ))
    }

    /// Substitute `{branch}` and `{service}` in a template.
    pub fn render(&self, template: &str, branch: &BranchName, service: Option<&ServiceName>) -> String {
        let rendered = template.replace("{branch}", branch.as_str());
        match service {
            Some(service) => rendered.replace("{service}", service.as_str()),
            None => rendered,
        }
    }

    /// Run a rendered command in `dir`, failing on non-zero exit.
    pub async fn run(
        &self,
        command: &str,
        dir: &Path,
        service: Option<&ServiceName>,
    ) -> Result<CommandOutput, CommandError> {
        tracing::debug!("Running `{}` in {}", command, dir.display());

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(dir)
            .envs(&self.env)
            .env("TANDEM_WORKSPACE", dir)
            .env("TANDEM_BRANCH", self.branch.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(service) = service {
            cmd.env("TANDEM_SERVICE", service.as_str());
        }

        let output = cmd.output().await.context(SpawnSnafu { command })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let status = match output.status.code() {
                Some(code) => format!("exit status {code}"),
                None => "a signal".to_string(),
            };
            return ExitSnafu {
                command,
                status,
                stderr: tail(stderr.trim(), STDERR_TAIL),
            }
            .fail();
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

fn tail(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &s[start..])
}

#[async_trait]
impl SourceSync for ShellCommands {
    async fn sync(&self, workspace: &Path, branch: &BranchName) -> Result<(), OpError> {
        let command = self.render(&self.templates.sync, branch, None);
        self.run(&command, workspace, None).await?;
        Ok(())
    }

    async fn has_update(&self, workspace: &Path, branch: &BranchName) -> Result<bool, OpError> {
        let command = self.render(&self.templates.check, branch, None);
        match self.run(&command, workspace, None).await {
            Ok(_) => Ok(true),
            Err(CommandError::Exit { stderr, .. }) => {
                if !stderr.is_empty() {
                    tracing::warn!("Update check reported: {}", stderr);
                }
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ImageBuilder for ShellCommands {
    async fn build(&self, service: &ServiceName) -> Result<(), OpError> {
        let command = self.render(&self.templates.build, &self.branch, Some(service));
        self.run(&command, &self.workspace, Some(service)).await?;
        Ok(())
    }
}

#[async_trait]
impl ServiceDeployer for ShellCommands {
    async fn deploy(&self, service: &ServiceName) -> Result<(), OpError> {
        let command = self.render(&self.templates.deploy, &self.branch, Some(service));
        self.run(&command, &self.workspace, Some(service)).await?;
        Ok(())
    }
}
