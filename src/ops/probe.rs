// ABOUTME: Health probes: HTTP GET over hyper, or a shell command's exit status.
// ABOUTME: Connection failures and timeouts are reported as unreachable, never as errors.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Uri;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;

use super::HealthProbe;
use crate::config::{Config, ProbeTarget, resolve_env_map};
use crate::pipeline::HealthStatus;
use crate::types::ServiceName;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid health check URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("failed to build request: {0}")]
    Request(String),
}

/// GETs an HTTP endpoint and compares the status code.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    uri: Uri,
    expected_status: u16,
    timeout: Duration,
}

impl HttpProbe {
    /// Only plain `http://` endpoints are supported.
    pub fn new(url: &str, expected_status: u16, timeout: Duration) -> Result<Self, ProbeError> {
        let invalid = |reason: &str| ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let uri = url.parse::<Uri>().map_err(|e| invalid(&e.to_string()))?;
        if uri.scheme_str() != Some("http") {
            return Err(invalid("only http:// URLs are supported"));
        }
        if uri.host().is_none() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            uri,
            expected_status,
            timeout,
        })
    }

    pub async fn check(&self) -> HealthStatus {
        match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(Ok(status)) if status == self.expected_status => HealthStatus::Healthy,
            Ok(Ok(status)) => {
                tracing::debug!("{} returned {}", self.uri, status);
                HealthStatus::Unhealthy
            }
            Ok(Err(e)) => {
                tracing::debug!("{} unreachable: {}", self.uri, e);
                HealthStatus::Unreachable
            }
            Err(_elapsed) => {
                tracing::debug!("{} timed out after {:?}", self.uri, self.timeout);
                HealthStatus::Unreachable
            }
        }
    }

    async fn request(&self) -> Result<u16, ProbeError> {
        let host = self.uri.host().unwrap_or("localhost");
        let port = self.uri.port_u16().unwrap_or(80);

        let stream = TcpStream::connect((connect_host(host), port)).await?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("health probe connection error: {}", e);
            }
        });

        let path = self
            .uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        let authority = self.uri.authority().map(|a| a.as_str()).unwrap_or(host);

        let req = hyper::Request::builder()
            .method("GET")
            .uri(path)
            .header("Host", authority)
            .header("User-Agent", concat!("tandem/", env!("CARGO_PKG_VERSION")))
            .body(Empty::<Bytes>::new())
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let resp = sender.send_request(req).await?;
        let status = resp.status().as_u16();

        // Drain the body so the connection closes cleanly
        let _ = resp.into_body().collect().await;

        Ok(status)
    }
}

/// Host as a socket address wants it: IPv6 literals lose their URI brackets.
fn connect_host(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Runs a shell command; exit status 0 means healthy.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    cmd: String,
    timeout: Duration,
    workspace: PathBuf,
    env: HashMap<String, String>,
}

impl CommandProbe {
    pub fn new(
        cmd: impl Into<String>,
        timeout: Duration,
        workspace: impl Into<PathBuf>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            cmd: cmd.into(),
            timeout,
            workspace: workspace.into(),
            env,
        }
    }

    pub async fn check(&self) -> HealthStatus {
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.cmd)
            .current_dir(&self.workspace)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(self.timeout, status).await {
            Ok(Ok(status)) if status.success() => HealthStatus::Healthy,
            Ok(Ok(status)) => {
                tracing::debug!("`{}` exited with {}", self.cmd, status);
                HealthStatus::Unhealthy
            }
            Ok(Err(e)) => {
                tracing::debug!("`{}` could not run: {}", self.cmd, e);
                HealthStatus::Unreachable
            }
            Err(_elapsed) => {
                tracing::debug!("`{}` timed out after {:?}", self.cmd, self.timeout);
                HealthStatus::Unreachable
            }
        }
    }
}

/// A probe bound to one service.
#[derive(Debug, Clone)]
pub enum TargetProbe {
    Http(HttpProbe),
    Command(CommandProbe),
}

impl TargetProbe {
    pub async fn check(&self) -> HealthStatus {
        match self {
            TargetProbe::Http(probe) => probe.check().await,
            TargetProbe::Command(probe) => probe.check().await,
        }
    }
}

/// Routes probes to the health check configured for each service.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredProbe {
    targets: HashMap<ServiceName, TargetProbe>,
}

impl ConfiguredProbe {
    pub fn new(targets: HashMap<ServiceName, TargetProbe>) -> Self {
        Self { targets }
    }

    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        use crate::error::Error;

        let env = resolve_env_map(&config.env)?;
        let mut targets = HashMap::new();

        for service in &config.services {
            let Some(hc) = &service.healthcheck else {
                continue;
            };
            let target = hc.target().map_err(Error::InvalidConfig)?;
            let probe = match target {
                ProbeTarget::Http {
                    url,
                    expected_status,
                } => TargetProbe::Http(
                    HttpProbe::new(&url, expected_status, hc.timeout)
                        .map_err(|e| Error::InvalidConfig(e.to_string()))?,
                ),
                ProbeTarget::Command { cmd } => TargetProbe::Command(CommandProbe::new(
                    cmd,
                    hc.timeout,
                    config.workspace(),
                    env.clone(),
                )),
            };
            targets.insert(service.name.clone(), probe);
        }

        Ok(Self { targets })
    }

    pub fn has_target(&self, service: &ServiceName) -> bool {
        self.targets.contains_key(service)
    }
}

#[async_trait]
impl HealthProbe for ConfiguredProbe {
    async fn probe(&self, service: &ServiceName) -> HealthStatus {
        match self.targets.get(service) {
            Some(target) => target.check().await,
            None => {
                tracing::warn!("No health check configured for {}", service);
                HealthStatus::Unreachable
            }
        }
    }
}
