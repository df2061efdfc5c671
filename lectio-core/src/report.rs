//! Outcome of a sync run.

use std::fmt;
use std::time::Duration;

use crate::diff::DiffKind;
use crate::error::StoreError;

/// A write that did not go through. Carries enough to retry or report it.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFailure {
    pub kind: DiffKind,
    pub external_id: String,
    pub error: StoreError,
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.external_id, self.error)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: Vec<OperationFailure>,
}

impl ExecutionResult {
    pub fn record_success(&mut self, kind: DiffKind) {
        match kind {
            DiffKind::Insert => self.inserted += 1,
            DiffKind::Update => self.updated += 1,
            DiffKind::Delete => self.deleted += 1,
        }
    }

    pub fn record_failure(&mut self, failure: OperationFailure) {
        self.failed.push(failure);
    }

    pub fn succeeded(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Counts plus wall-clock time of the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub result: ExecutionResult,
    pub elapsed: Duration,
}

impl SyncReport {
    /// Elapsed time rounded to milliseconds for display.
    pub fn elapsed_display(&self) -> String {
        let rounded = Duration::from_millis(self.elapsed.as_millis() as u64);
        humantime::format_duration(rounded).to_string()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = &self.result;
        writeln!(f, "Inserted {} events", result.inserted)?;
        writeln!(f, "Updated {} events", result.updated)?;
        writeln!(f, "Deleted {} events", result.deleted)?;
        writeln!(f, "Failed {} operations", result.failed.len())?;
        for failure in &result.failed {
            writeln!(f, "  {failure}")?;
        }
        write!(f, "Took {}", self.elapsed_display())
    }
}
