// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a tandem.yml describing a backend gated ahead of its logger.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

const TEMPLATE: &str = r#"project: power-monitor
branch: main

# Deployed in order. A service with a healthcheck gates every service after it.
services:
  - name: backend
    healthcheck:
      url: http://localhost:8000/health/
      interval: 15s
      max_attempts: 10
      timeout: 10s
  - name: logger

# Shell templates run in the workspace; {service} and {branch} are substituted.
# commands:
#   sync: "git fetch origin {branch} && git checkout -q {branch} && git reset --hard origin/{branch}"
#   build: "docker compose build {service}"
#   deploy: "docker compose up -d --no-deps {service}"

schedule:
  interval: 5m
"#;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;
    Ok(())
}

/// The template written by `init`.
pub fn template_yaml() -> &'static str {
    TEMPLATE
}
