// ABOUTME: Integration tests for the HTTP and command health probes.
// ABOUTME: Serves canned responses from a local listener to exercise status mapping.

mod support;

use std::collections::HashMap;
use std::time::Duration;
use support::service;
use tandem::config::Config;
use tandem::ops::{CommandProbe, ConfiguredProbe, HealthProbe, HttpProbe, ProbeError};
use tandem::pipeline::HealthStatus;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Answer every connection with `status`; returns the base URL.
async fn serve(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response =
                    format!("HTTP/1.1 {status}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok");
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

/// A port with nothing listening on it.
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/health/")
}

#[tokio::test]
async fn ok_response_is_healthy() {
    support::init_tracing();
    let base = serve("200 OK").await;
    let probe = HttpProbe::new(&format!("{base}/health/"), 200, Duration::from_secs(5)).unwrap();
    assert_eq!(probe.check().await, HealthStatus::Healthy);
}

#[tokio::test]
async fn ipv6_loopback_url_is_reachable() {
    // Hosts without IPv6 loopback have nothing to test
    let Ok(listener) = TcpListener::bind("[::1]:0").await else {
        return;
    };
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
            let _ = socket.shutdown().await;
        }
    });

    let probe =
        HttpProbe::new(&format!("http://[::1]:{port}/health/"), 200, Duration::from_secs(5)).unwrap();
    assert_eq!(probe.check().await, HealthStatus::Healthy);
}

#[tokio::test]
async fn unexpected_status_is_unhealthy() {
    let base = serve("503 Service Unavailable").await;
    let probe = HttpProbe::new(&format!("{base}/health/"), 200, Duration::from_secs(5)).unwrap();
    assert_eq!(probe.check().await, HealthStatus::Unhealthy);
}

#[tokio::test]
async fn expected_status_is_configurable() {
    let base = serve("204 No Content").await;
    let probe = HttpProbe::new(&format!("{base}/ping"), 204, Duration::from_secs(5)).unwrap();
    assert_eq!(probe.check().await, HealthStatus::Healthy);
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let probe = HttpProbe::new(&closed_port().await, 200, Duration::from_secs(5)).unwrap();
    assert_eq!(probe.check().await, HealthStatus::Unreachable);
}

#[tokio::test]
async fn silent_server_times_out_as_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept but never answer
    let _hold = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let probe = HttpProbe::new(&format!("http://{addr}/"), 200, Duration::from_millis(200)).unwrap();
    assert_eq!(probe.check().await, HealthStatus::Unreachable);
}

#[test]
fn https_urls_are_rejected() {
    let err = HttpProbe::new("https://example.com/health", 200, Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ProbeError::InvalidUrl { .. }));
}

#[tokio::test]
async fn command_probe_maps_exit_status() {
    let ok = CommandProbe::new("true", Duration::from_secs(5), ".", HashMap::new());
    let failing = CommandProbe::new("exit 3", Duration::from_secs(5), ".", HashMap::new());
    let slow = CommandProbe::new("sleep 5", Duration::from_millis(100), ".", HashMap::new());

    assert_eq!(ok.check().await, HealthStatus::Healthy);
    assert_eq!(failing.check().await, HealthStatus::Unhealthy);
    assert_eq!(slow.check().await, HealthStatus::Unreachable);
}

#[tokio::test]
async fn command_probe_sees_configured_env() {
    let env = HashMap::from([("EXPECTED".to_string(), "yes".to_string())]);
    let probe = CommandProbe::new(
        r#"test "$EXPECTED" = yes"#,
        Duration::from_secs(5),
        ".",
        env,
    );
    assert_eq!(probe.check().await, HealthStatus::Healthy);
}

#[tokio::test]
async fn configured_probe_routes_by_service() {
    let base = serve("200 OK").await;
    let yaml = format!(
        r#"
project: power-monitor
services:
  - name: backend
    healthcheck:
      url: {base}/health/
  - name: worker
    healthcheck:
      cmd: "exit 1"
  - logger
"#
    );
    let config = Config::from_yaml(&yaml).unwrap();
    let probe = ConfiguredProbe::from_config(&config).unwrap();

    assert!(probe.has_target(&service("backend")));
    assert!(!probe.has_target(&service("logger")));
    assert_eq!(probe.probe(&service("backend")).await, HealthStatus::Healthy);
    assert_eq!(probe.probe(&service("worker")).await, HealthStatus::Unhealthy);
    assert_eq!(probe.probe(&service("logger")).await, HealthStatus::Unreachable);
}
