// ABOUTME: Configuration types and parsing for tandem.yml.
// ABOUTME: Handles YAML parsing, discovery, validation and env interpolation.

mod commands;
mod deserialize;
mod env_value;
mod healthcheck;
mod init;
mod schedule;
mod service;

pub use commands::CommandsConfig;
pub use env_value::{EnvValue, resolve_env_map};
pub use healthcheck::{HealthcheckConfig, ProbeTarget};
pub use init::{init_config, template_yaml};
pub use schedule::ScheduleConfig;
pub use service::ServiceConfig;

use crate::error::{Error, Result};
use crate::types::{BranchName, ServiceName};
use deserialize::{deserialize_branch_name, deserialize_service_name, deserialize_services};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "tandem.yml";
pub const CONFIG_FILENAME_ALT: &str = "tandem.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".tandem/config.yml";

/// Default hooks directory, relative to the workspace.
pub const DEFAULT_HOOKS_DIR: &str = ".tandem/hooks";

/// Immutable description of the pipeline, fixed for the lifetime of a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_service_name")]
    pub project: ServiceName,

    /// Checkout the pipeline operates on; relative paths resolve against the config file.
    #[serde(default)]
    pub workspace: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_branch_name")]
    pub branch: BranchName,

    #[serde(deserialize_with = "deserialize_services")]
    pub services: NonEmpty<ServiceConfig>,

    #[serde(default)]
    pub commands: CommandsConfig,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub hooks_dir: Option<PathBuf>,

    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; a relative or missing workspace resolves to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        let base = config_base_dir(path);
        config.workspace = Some(match config.workspace.take() {
            Some(ws) if ws.is_relative() => base.join(ws),
            Some(ws) => ws,
            None => base,
        });

        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.schedule.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "schedule.interval must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if !seen.insert(&service.name) {
                return Err(Error::InvalidConfig(format!(
                    "service '{}' is listed more than once",
                    service.name
                )));
            }
            if let Some(hc) = &service.healthcheck {
                hc.target().map_err(|e| {
                    Error::InvalidConfig(format!("service '{}': {}", service.name, e))
                })?;
            }
        }
        Ok(())
    }

    /// Workspace directory, falling back to the current directory.
    pub fn workspace(&self) -> PathBuf {
        self.workspace.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn hooks_dir(&self) -> PathBuf {
        match &self.hooks_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.workspace().join(dir),
            None => self.workspace().join(DEFAULT_HOOKS_DIR),
        }
    }

    /// Directory holding run lock files (XDG state dir by default).
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("tandem");
        }
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/state/tandem"))
            .unwrap_or_else(|| std::env::temp_dir().join("tandem-state"))
    }

    /// Look up a service entry by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name.as_str() == name)
    }
}

fn config_base_dir(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    // .tandem/config.yml describes the directory above .tandem
    if parent.file_name().is_some_and(|n| n == ".tandem") {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}
