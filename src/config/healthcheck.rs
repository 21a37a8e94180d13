// ABOUTME: Health gate configuration for a service.
// ABOUTME: Either an HTTP endpoint or a shell command, plus bounded retry parameters.

use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::pipeline::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthcheckConfig {
    /// HTTP endpoint polled with GET.
    #[serde(default)]
    pub url: Option<String>,

    /// Shell command; exit status 0 means healthy.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: NonZeroU32,

    /// Upper bound on a single probe.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

/// How a service's health signal is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeTarget {
    Http { url: String, expected_status: u16 },
    Command { cmd: String },
}

impl HealthcheckConfig {
    /// Health check against an HTTP endpoint with default retry settings.
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            cmd: None,
            interval: default_interval(),
            max_attempts: default_max_attempts(),
            timeout: default_timeout(),
            expected_status: default_expected_status(),
        }
    }

    /// Resolve the probe target; exactly one of `url` and `cmd` must be set.
    pub fn target(&self) -> Result<ProbeTarget, String> {
        match (&self.url, &self.cmd) {
            (Some(url), None) => Ok(ProbeTarget::Http {
                url: url.clone(),
                expected_status: self.expected_status,
            }),
            (None, Some(cmd)) => Ok(ProbeTarget::Command { cmd: cmd.clone() }),
            (Some(_), Some(_)) => Err("healthcheck must set only one of 'url' or 'cmd'".to_string()),
            (None, None) => Err("healthcheck requires 'url' or 'cmd'".to_string()),
        }
    }

    /// Retry policy gating on an observed `healthy` signal.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.interval)
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_max_attempts() -> NonZeroU32 {
    NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN)
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_expected_status() -> u16 {
    200
}
