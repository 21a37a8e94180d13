// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects warnings that shouldn't fail a run but should be shown to users.

/// Collects non-fatal warnings during pipeline operations.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Remove and return collected warnings.
    pub fn drain(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a lock release warning.
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LockRelease,
            message: message.into(),
        }
    }

    /// Create a notification delivery warning.
    pub fn notification(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Notification,
            message: message.into(),
        }
    }

    /// Create a warning for a trigger that did not start a run.
    pub fn trigger_rejected(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::TriggerRejected,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur around a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Failed to remove the run lock (lock file may remain).
    LockRelease,
    /// The notification sink reported an error.
    Notification,
    /// A trigger was rejected or its update check failed.
    TriggerRejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_and_drains_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::lock_release("failed to remove lock file"));
        diag.warn(Warning::notification("on-failure hook exited 1"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);

        let drained = diag.drain();
        assert_eq!(drained.len(), 2);
        assert!(!diag.has_warnings());
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::lock_release("x").kind, WarningKind::LockRelease);
        assert_eq!(Warning::notification("x").kind, WarningKind::Notification);
        assert_eq!(
            Warning::trigger_rejected("x").kind,
            WarningKind::TriggerRejected
        );
    }
}
