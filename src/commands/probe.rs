// ABOUTME: Probe command implementation.
// ABOUTME: Runs one service's health check once and reports the result.

use tandem::config::Config;
use tandem::error::{Error, Result};
use tandem::ops::{ConfiguredProbe, HealthProbe};
use tandem::output::Output;
use tandem::pipeline::HealthStatus;

pub async fn probe(config: &Config, service: &str, output: &Output) -> Result<()> {
    let entry = config
        .service(service)
        .ok_or_else(|| Error::UnknownService(service.to_string()))?;
    if entry.healthcheck.is_none() {
        return Err(Error::InvalidConfig(format!(
            "service '{service}' has no healthcheck"
        )));
    }

    let probe = ConfiguredProbe::from_config(config)?;
    let status = probe.probe(&entry.name).await;

    if status == HealthStatus::Healthy {
        output.success(&format!("{} is {status}", entry.name));
        Ok(())
    } else {
        Err(Error::Unhealthy {
            service: entry.name.to_string(),
            status: status.to_string(),
        })
    }
}
