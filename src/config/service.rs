// ABOUTME: Per-service configuration entry.
// ABOUTME: Accepts either a bare name or a mapping with an optional health check.

use serde::Deserialize;

use super::HealthcheckConfig;
use super::deserialize::deserialize_service_name;
use crate::types::ServiceName;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(deserialize_with = "deserialize_service_name")]
    pub name: ServiceName,

    /// Gate that must pass before later services are deployed.
    #[serde(default)]
    pub healthcheck: Option<HealthcheckConfig>,
}

impl ServiceConfig {
    pub fn new(name: ServiceName) -> Self {
        Self {
            name,
            healthcheck: None,
        }
    }

    pub fn with_healthcheck(mut self, healthcheck: HealthcheckConfig) -> Self {
        self.healthcheck = Some(healthcheck);
        self
    }
}
