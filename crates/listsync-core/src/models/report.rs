//! Outcome of a synchronization run

use serde::{Deserialize, Serialize};

use super::ListTarget;

/// A definition that could not be synchronized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    /// List code of the failing definition
    pub code: String,
    pub message: String,
}

/// Visual variant a caller should use when presenting a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportVariant {
    Success,
    Destructive,
}

/// Summary of one `auto_sync` run.
///
/// `created + updated + skipped + failed` always equals the number of
/// definitions processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub target: ListTarget,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_ms: u64,
    /// Run start (Unix ms)
    pub started_at: i64,
    pub errors: Vec<SyncFailure>,
}

impl SyncReport {
    /// Empty report for a run starting at `started_at`
    #[must_use]
    pub const fn new(target: ListTarget, started_at: i64) -> Self {
        Self {
            target,
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            duration_ms: 0,
            started_at,
            errors: Vec::new(),
        }
    }

    /// Record a failed definition
    pub fn record_failure(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(SyncFailure {
            code: code.into(),
            message: message.into(),
        });
    }

    /// Number of definitions processed
    pub const fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }

    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub const fn variant(&self) -> ReportVariant {
        if self.is_success() {
            ReportVariant::Success
        } else {
            ReportVariant::Destructive
        }
    }

    /// One-line banner text
    pub fn summary(&self) -> String {
        format!(
            "{} lists: {} created, {} updated, {} skipped, {} failed in {} ms",
            self.target,
            self.created,
            self.updated,
            self.skipped,
            self.failed,
            self.duration_ms
        )
    }
}
