// ABOUTME: Identifier for a single pipeline run.
// ABOUTME: Built from the UTC start time plus a per-process sequence number.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Identifies one run in logs, notifications and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create an id for a run starting now.
    pub fn generate() -> Self {
        Self::at(Utc::now())
    }

    /// Create an id for a run starting at the given instant.
    pub fn at(started: DateTime<Utc>) -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{}", started.format("%Y%m%dT%H%M%SZ"), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
