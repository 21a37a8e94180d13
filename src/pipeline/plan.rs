// ABOUTME: Builds the linear stage sequence from configuration.
// ABOUTME: sync, every build in order, then each deploy followed by its health gate.

use super::stage::Stage;
use crate::config::Config;

/// Stage sequence for `config`.
///
/// For services `[backend (with healthcheck), logger]` this yields
/// `sync, build:backend, build:logger, deploy:backend, health:backend, deploy:logger`.
pub fn plan(config: &Config) -> Vec<Stage> {
    let mut stages = vec![Stage::sync(config.workspace(), config.branch.clone())];

    stages.extend(config.services.iter().map(|s| Stage::build(s.name.clone())));

    for service in &config.services {
        stages.push(Stage::deploy(service.name.clone()));
        if let Some(hc) = &service.healthcheck {
            stages.push(Stage::health_gate(service.name.clone(), hc.retry_policy()));
        }
    }

    stages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_gate_precedes_logger_deploy() {
        let config = Config::from_yaml(
            r#"
project: power-monitor
services:
  - name: backend
    healthcheck:
      url: http://localhost:8000/health/
  - logger
"#,
        )
        .unwrap();

        let names: Vec<_> = plan(&config).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(
            names,
            [
                "sync",
                "build:backend",
                "build:logger",
                "deploy:backend",
                "health:backend",
                "deploy:logger"
            ]
        );
    }

    #[test]
    fn services_without_healthcheck_are_not_gated() {
        let config = Config::from_yaml("project: p\nservices: [a, b]\n").unwrap();
        let stages = plan(&config);
        assert_eq!(stages.len(), 5);
        assert!(stages.iter().all(|s| s.retry_policy().is_none()));
    }
}
