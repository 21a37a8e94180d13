// ABOUTME: Stage sequencing and health gating for coupled service rollouts.
// ABOUTME: Exports the run typestate, stages, retry policy, gate, runner and dispatcher.

mod cancel;
mod dispatch;
mod error;
mod gate;
mod lock;
mod observer;
mod plan;
mod retry;
mod run;
mod runner;
mod stage;
mod state;
mod watch;

pub use cancel::CancelToken;
pub use dispatch::{Dispatcher, LockSettings};
pub use error::{DispatchError, RunFailure, StageError, StageErrorKind};
pub use gate::{GateReport, HealthGate};
pub use lock::{LockError, LockInfo, RunLock};
pub use observer::{NoopObserver, RunObserver};
pub use plan::plan;
pub use retry::{HealthObservation, HealthStatus, RetryPolicy, SuccessPredicate};
pub use run::{
    FailureReport, Notice, PipelineRun, RunOutcome, RunReport, StageOutcome, StageReport,
    StageResult, StageStatus, Trigger, TriggerSource,
};
pub use runner::{Collaborators, StageRunner};
pub use stage::{Stage, StageAction, StageKind};
pub use state::{Finished, Pending, RunState, RunStatus, Running};
pub use watch::{WatchSettings, WatchSummary, watch};
