// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and recording fakes for every pipeline collaborator.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;
use tandem::ops::{
    HealthProbe, ImageBuilder, NotificationSink, OpError, ServiceDeployer, Sleeper, SourceSync,
};
use tandem::pipeline::{Collaborators, HealthStatus, Notice};
use tandem::types::{BranchName, ServiceName};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("tandem=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn service(name: &str) -> ServiceName {
    ServiceName::new(name).unwrap()
}

/// Ordered log of collaborator calls shared by all fakes of one test.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

#[derive(Default)]
pub struct FakeSync {
    pub log: CallLog,
    pub fail: bool,
    pub update: bool,
}

#[async_trait]
impl SourceSync for FakeSync {
    async fn sync(&self, _workspace: &Path, branch: &BranchName) -> Result<(), OpError> {
        self.log.push(format!("sync:{branch}"));
        if self.fail {
            return Err(OpError::failed("remote unreachable"));
        }
        Ok(())
    }

    async fn has_update(&self, _workspace: &Path, _branch: &BranchName) -> Result<bool, OpError> {
        self.log.push("has_update");
        Ok(self.update)
    }
}

/// Builder and deployer that fail for the named services.
#[derive(Default)]
pub struct FakeServices {
    pub log: CallLog,
    pub failing_builds: HashSet<String>,
    pub failing_deploys: HashSet<String>,
}

#[async_trait]
impl ImageBuilder for FakeServices {
    async fn build(&self, service: &ServiceName) -> Result<(), OpError> {
        self.log.push(format!("build:{service}"));
        if self.failing_builds.contains(service.as_str()) {
            return Err(OpError::failed("exit status 1"));
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceDeployer for FakeServices {
    async fn deploy(&self, service: &ServiceName) -> Result<(), OpError> {
        self.log.push(format!("deploy:{service}"));
        if self.failing_deploys.contains(service.as_str()) {
            return Err(OpError::failed("container exited"));
        }
        Ok(())
    }
}

/// Returns scripted statuses in order, then repeats the fallback.
pub struct ScriptedProbe {
    pub log: CallLog,
    script: Mutex<VecDeque<HealthStatus>>,
    fallback: HealthStatus,
}

#[allow(dead_code)]
impl ScriptedProbe {
    pub fn new(script: impl IntoIterator<Item = HealthStatus>, fallback: HealthStatus) -> Self {
        Self {
            log: CallLog::default(),
            script: Mutex::new(script.into_iter().collect()),
            fallback,
        }
    }

    pub fn always(status: HealthStatus) -> Self {
        Self::new([], status)
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, service: &ServiceName) -> HealthStatus {
        self.log.push(format!("probe:{service}"));
        self.script.lock().pop_front().unwrap_or(self.fallback)
    }
}

/// Records requested waits and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: Mutex<Vec<Duration>>,
}

#[allow(dead_code)]
impl RecordingSleeper {
    pub fn total(&self) -> Duration {
        self.waits.lock().iter().sum()
    }

    pub fn count(&self) -> usize {
        self.waits.lock().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

/// Sleeper that never wakes, for cancellation tests.
#[allow(dead_code)]
pub struct PendingSleeper;

#[async_trait]
impl Sleeper for PendingSleeper {
    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await;
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), OpError> {
        self.notices.lock().push(notice.clone());
        if self.fail {
            return Err(OpError::failed("webhook returned 500"));
        }
        Ok(())
    }
}

/// A full set of fakes sharing one call log.
#[allow(dead_code)]
pub struct Fakes {
    pub log: CallLog,
    pub sync: Arc<FakeSync>,
    pub services: Arc<FakeServices>,
    pub probe: Arc<ScriptedProbe>,
    pub notifier: Arc<RecordingNotifier>,
    pub sleeper: Arc<RecordingSleeper>,
}

#[allow(dead_code)]
impl Fakes {
    pub fn healthy() -> Self {
        Self::with_probe(ScriptedProbe::always(HealthStatus::Healthy))
    }

    pub fn with_probe(probe: ScriptedProbe) -> Self {
        let log = CallLog::default();
        Self {
            sync: Arc::new(FakeSync {
                log: log.clone(),
                ..Default::default()
            }),
            services: Arc::new(FakeServices {
                log: log.clone(),
                ..Default::default()
            }),
            probe: Arc::new(probe.with_log(log.clone())),
            notifier: Arc::new(RecordingNotifier::default()),
            sleeper: Arc::new(RecordingSleeper::default()),
            log,
        }
    }

    pub fn failing_build(mut self, service: &str) -> Self {
        self.services = Arc::new(FakeServices {
            log: self.log.clone(),
            failing_builds: [service.to_string()].into(),
            failing_deploys: HashSet::new(),
        });
        self
    }

    pub fn failing_sync(mut self) -> Self {
        self.sync = Arc::new(FakeSync {
            log: self.log.clone(),
            fail: true,
            update: false,
        });
        self
    }

    pub fn failing_deploy(mut self, service: &str) -> Self {
        self.services = Arc::new(FakeServices {
            log: self.log.clone(),
            failing_builds: HashSet::new(),
            failing_deploys: [service.to_string()].into(),
        });
        self
    }

    pub fn failing_notifier(mut self) -> Self {
        self.notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            sync: self.sync.clone(),
            builder: self.services.clone(),
            deployer: self.services.clone(),
            probe: self.probe.clone(),
            notifier: self.notifier.clone(),
            sleeper: self.sleeper.clone(),
        }
    }
}

/// Config with a health-gated backend followed by an ungated logger.
#[allow(dead_code)]
pub const BACKEND_LOGGER: &str = r#"
project: power-monitor
services:
  - name: backend
    healthcheck:
      url: http://localhost:8000/health/
  - logger
"#;
