//! Import events and summaries
//!
//! Every sheet announces its row count once and ends with exactly one
//! terminal status. The per-sheet summaries are rolled up into an
//! [`ImportSummary`] for the caller.

use super::batch::SubmissionReport;
use serde::Serialize;
use std::time::Duration;

/// Terminal status of one sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SheetStatus {
    Done,
    Warning { description: String },
    Error { description: String },
}

impl SheetStatus {
    pub fn warning(description: impl Into<String>) -> Self {
        SheetStatus::Warning {
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        SheetStatus::Error {
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SheetStatus::Error { .. })
    }
}

/// Progress payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SheetEventKind {
    /// Row count, sent once before any row is transformed
    Info { total: usize },
    /// Terminal status, sent once
    Status(SheetStatus),
}

/// Event sent to the caller while sheets are imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetEvent {
    pub sheet: String,
    #[serde(flatten)]
    pub kind: SheetEventKind,
}

impl SheetEvent {
    pub fn info(sheet: &str, total: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            kind: SheetEventKind::Info { total },
        }
    }

    pub fn status(sheet: &str, status: SheetStatus) -> Self {
        Self {
            sheet: sheet.to_string(),
            kind: SheetEventKind::Status(status),
        }
    }
}

/// Result of importing one sheet
#[derive(Debug, Clone)]
pub struct SheetSummary {
    pub sheet: String,
    pub total_rows: usize,
    pub rows_failed: usize,
    pub resources_generated: usize,
    pub submission: SubmissionReport,
    pub status: SheetStatus,
    /// Stopped early on a shutdown signal
    pub cancelled: bool,
    pub duration: Duration,
}

impl SheetSummary {
    /// Summary for a sheet that ended before any row was transformed
    pub fn new(sheet: &str, status: SheetStatus) -> Self {
        Self {
            sheet: sheet.to_string(),
            total_rows: 0,
            rows_failed: 0,
            resources_generated: 0,
            submission: SubmissionReport::default(),
            status,
            cancelled: false,
            duration: Duration::ZERO,
        }
    }

    /// Whether anything was lost on the way to the server
    pub fn is_clean(&self) -> bool {
        !self.status.is_error() && self.rows_failed == 0 && self.submission.is_complete()
    }
}

/// Result of one import run
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub sheets: Vec<SheetSummary>,
    pub duration: Duration,
}

impl ImportSummary {
    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.total_rows).sum()
    }

    pub fn resources_generated(&self) -> usize {
        self.sheets.iter().map(|s| s.resources_generated).sum()
    }

    pub fn resources_uploaded(&self) -> usize {
        self.sheets.iter().map(|s| s.submission.resources_uploaded).sum()
    }

    pub fn chunks_failed(&self) -> usize {
        self.sheets.iter().map(|s| s.submission.chunks_failed).sum()
    }

    /// Whether any sheet stopped on a shutdown signal
    pub fn was_cancelled(&self) -> bool {
        self.sheets.iter().any(|s| s.cancelled)
    }

    /// Whether every sheet finished without losing rows or chunks
    pub fn is_successful(&self) -> bool {
        self.sheets.iter().all(SheetSummary::is_clean)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            sheets = self.sheets.len(),
            rows = self.total_rows(),
            resources = self.resources_generated(),
            uploaded = self.resources_uploaded(),
            chunks_failed = self.chunks_failed(),
            duration_secs = self.duration.as_secs(),
            "Import completed"
        );

        for sheet in self.sheets.iter().filter(|s| !s.is_clean()) {
            tracing::warn!(
                sheet = %sheet.sheet,
                status = ?sheet.status,
                rows_failed = sheet.rows_failed,
                chunks_failed = sheet.submission.chunks_failed,
                chunks_skipped = sheet.submission.chunks_skipped,
                "Sheet completed with losses"
            );
        }
    }
}
