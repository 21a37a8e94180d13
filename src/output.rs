// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes, and reports run progress.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use crate::pipeline::{
    HealthObservation, RunObserver, RunReport, Stage, StageOutcome, StageResult, Trigger,
};
use crate::types::{RunId, ServiceName};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
    stage_starts: Mutex<HashMap<String, Instant>>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
            stage_starts: Mutex::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => emit(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print a warning. Shown in every mode.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => emit_err(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => emit_err(&JsonEvent {
                event: "error",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print the final report of a run.
    pub fn report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Json => emit(&ReportEvent {
                event: "run_finished",
                report,
            }),
            OutputMode::Normal | OutputMode::Quiet => match &report.failure {
                None => println!("Run {} succeeded", report.id),
                Some(failure) => eprintln!(
                    "Run {} failed at {} ({}): {}",
                    report.id, failure.stage, failure.kind, failure.detail
                ),
            },
        }
    }
}

impl RunObserver for Output {
    fn run_started(&self, id: &RunId, trigger: &Trigger) {
        match self.mode {
            OutputMode::Normal => println!("Run {id} ({})", trigger.reason),
            OutputMode::Json => emit(&JsonEvent {
                event: "run_started",
                message: &format!("{id} ({})", trigger.reason),
                duration_secs: None,
            }),
            OutputMode::Quiet => {}
        }
    }

    fn stage_started(&self, stage: &Stage) {
        self.stage_starts
            .lock()
            .insert(stage.name().to_string(), Instant::now());
        self.progress(&format!("  → {}...", stage.describe()));
    }

    fn gate_attempt(
        &self,
        service: &ServiceName,
        attempt: u32,
        max_attempts: u32,
        observation: &HealthObservation,
    ) {
        match self.mode {
            OutputMode::Normal => println!(
                "    {service}: {} (attempt {attempt}/{max_attempts})",
                observation.status
            ),
            OutputMode::Json => emit(&GateEvent {
                event: "health_attempt",
                service: service.as_str(),
                attempt,
                max_attempts,
                status: &observation.status.to_string(),
            }),
            OutputMode::Quiet => {}
        }
    }

    fn stage_finished(&self, stage: &Stage, outcome: &StageOutcome) {
        let started = self.stage_starts.lock().remove(stage.name());
        let secs = started.map(|t| t.elapsed().as_secs_f64());

        match (&outcome.result, self.mode) {
            (StageResult::Succeeded { .. }, OutputMode::Normal) => match secs {
                Some(secs) => println!("  ✓ {} ({secs:.1}s)", stage.name()),
                None => println!("  ✓ {}", stage.name()),
            },
            (StageResult::Failed(err), OutputMode::Normal | OutputMode::Quiet) => {
                eprintln!("  ✗ {}: {err}", stage.name());
            }
            (result, OutputMode::Json) => {
                let (event, message) = match result {
                    StageResult::Succeeded { detail } => {
                        ("stage_succeeded", detail.clone().unwrap_or_default())
                    }
                    StageResult::Failed(err) => ("stage_failed", err.to_string()),
                };
                emit(&StageEvent {
                    event,
                    stage: stage.name(),
                    message: &message,
                    duration_secs: secs,
                });
            }
            (StageResult::Succeeded { .. }, OutputMode::Quiet) => {}
        }
    }
}

fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_err<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct StageEvent<'a> {
    event: &'a str,
    stage: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct GateEvent<'a> {
    event: &'a str,
    service: &'a str,
    attempt: u32,
    max_attempts: u32,
    status: &'a str,
}

#[derive(Serialize)]
struct ReportEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    report: &'a RunReport,
}
