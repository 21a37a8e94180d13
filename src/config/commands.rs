// ABOUTME: Shell command templates for the external collaborators.
// ABOUTME: Placeholders {service} and {branch} are substituted before execution.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    #[serde(default = "default_sync")]
    pub sync: String,

    #[serde(default = "default_build")]
    pub build: String,

    #[serde(default = "default_deploy")]
    pub deploy: String,

    /// Exit status 0 means the remote branch has commits the workspace lacks.
    #[serde(default = "default_check")]
    pub check: String,
}

fn default_sync() -> String {
    "git fetch origin {branch} && git checkout -q {branch} && git reset --hard origin/{branch}"
        .to_string()
}

fn default_build() -> String {
    "docker compose build {service}".to_string()
}

fn default_deploy() -> String {
    "docker compose up -d --no-deps {service}".to_string()
}

fn default_check() -> String {
    "git fetch -q origin {branch} && test \"$(git rev-parse HEAD)\" != \"$(git rev-parse origin/{branch})\""
        .to_string()
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            sync: default_sync(),
            build: default_build(),
            deploy: default_deploy(),
            check: default_check(),
        }
    }
}
