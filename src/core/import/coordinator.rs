//! Import coordinator - orchestrates sheet imports
//!
//! For every sheet of the mapping document the coordinator announces the row
//! count, transforms the rows, submits the generated resources and reports a
//! terminal status. Sheets run concurrently; they share one lookup session
//! and one pool of upload slots.

use super::batch::BatchSubmitter;
use super::summary::{ImportSummary, SheetEvent, SheetStatus, SheetSummary};
use crate::adapters::fhir::LookupService;
use crate::config::{ImportConfig, RetryConfig, TabulaConfig};
use crate::core::transform::{compile_rules, transform_rows, LookupSession};
use crate::domain::{MappingDocument, MappingRule, TabulaError, Workbook};
use crate::{log_sheet_complete, log_sheet_start};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Semaphore};

/// Import coordinator
pub struct ImportCoordinator {
    import: ImportConfig,
    service: Arc<dyn LookupService>,
    submitter: BatchSubmitter,
    shutdown: watch::Receiver<bool>,
}

impl ImportCoordinator {
    /// Create a coordinator from the loaded configuration
    pub fn new(
        config: &TabulaConfig,
        service: Arc<dyn LookupService>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self::from_parts(
            config.import.clone(),
            config.fhir.retry.clone(),
            config.dry_run(),
            service,
            shutdown,
        )
    }

    /// Create a coordinator from individual settings
    pub fn from_parts(
        import: ImportConfig,
        retry: RetryConfig,
        dry_run: bool,
        service: Arc<dyn LookupService>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let uploads = Arc::new(Semaphore::new(import.max_concurrent_uploads.max(1)));
        let submitter = BatchSubmitter::new(service.clone(), uploads, import.chunk_size)
            .with_retry(retry)
            .with_dry_run(dry_run);

        Self {
            import,
            service,
            submitter,
            shutdown,
        }
    }

    /// Import every sheet of the mapping document, or only `only` when given
    ///
    /// Progress is reported on `events`; a closed receiver does not stop the
    /// import.
    pub async fn run(
        &self,
        mapping: &MappingDocument,
        workbook: &Workbook,
        only: Option<&str>,
        events: &mpsc::UnboundedSender<SheetEvent>,
    ) -> ImportSummary {
        let start_time = Instant::now();
        let session = LookupSession::new(
            self.service.clone(),
            Duration::from_secs(self.import.lookup_timeout_seconds),
        );

        let sheets = mapping
            .sheets
            .iter()
            .filter(|(name, _)| only.map_or(true, |wanted| wanted == name.as_str()));

        tracing::info!(
            sheets = mapping.sheets.len(),
            filter = ?only,
            chunk_size = self.import.chunk_size,
            row_concurrency = self.import.row_concurrency,
            "Starting import"
        );

        let sheets = join_all(sheets.map(|(name, rules)| {
            self.import_sheet(name, rules, mapping, workbook, &session, events)
        }))
        .await;

        tracing::debug!(lookups_cached = session.cached(), "Lookup session closed");

        let summary = ImportSummary {
            sheets,
            duration: Duration::ZERO,
        }
        .with_duration(start_time.elapsed());
        summary.log_summary();
        summary
    }

    async fn import_sheet(
        &self,
        sheet: &str,
        rules: &[MappingRule],
        mapping: &MappingDocument,
        workbook: &Workbook,
        session: &LookupSession,
        events: &mpsc::UnboundedSender<SheetEvent>,
    ) -> SheetSummary {
        let start_time = Instant::now();
        let finish = |mut summary: SheetSummary| {
            let _ = events.send(SheetEvent::status(sheet, summary.status.clone()));
            summary.duration = start_time.elapsed();
            summary
        };

        let rows = workbook.get(sheet);
        let _ = events.send(SheetEvent::info(sheet, rows.map_or(0, Vec::len)));

        let Some(rows) = rows else {
            tracing::error!(sheet = %sheet, "Sheet missing from row data");
            return finish(SheetSummary::new(
                sheet,
                SheetStatus::error(format!("Transform error for sheet: {sheet}")),
            ));
        };

        if rows.is_empty() {
            tracing::warn!(sheet = %sheet, "Sheet has no rows");
            return finish(SheetSummary::new(sheet, SheetStatus::warning("Empty sheet")));
        }

        log_sheet_start!(sheet, rows.len());

        let compiled = compile_rules(sheet, rules, &mapping.concept_maps);
        let output = match transform_rows(
            sheet,
            rows,
            &compiled,
            &self.import.profiles,
            session,
            self.import.row_concurrency,
            &self.shutdown,
        )
        .await
        {
            Ok(output) => output,
            Err(e) => {
                let mut summary = SheetSummary::new(sheet, SheetStatus::Done);
                summary.total_rows = rows.len();
                summary.status = match e {
                    TabulaError::Cancelled(description) => {
                        summary.cancelled = true;
                        SheetStatus::error(description)
                    }
                    other => {
                        tracing::error!(sheet = %sheet, error = %other, "Sheet transformation failed");
                        SheetStatus::error(format!("Transform error for sheet: {sheet}"))
                    }
                };
                return finish(summary);
            }
        };

        let mut summary = SheetSummary::new(sheet, SheetStatus::Done);
        summary.total_rows = rows.len();
        summary.rows_failed = output.rows_failed;
        summary.resources_generated = output.resources.len();

        if output.resources.is_empty() {
            tracing::warn!(sheet = %sheet, rows = rows.len(), "No resources generated");
            summary.status = SheetStatus::warning("Empty sheet");
            return finish(summary);
        }

        summary.submission = self
            .submitter
            .submit(sheet, &output.resources, &self.shutdown)
            .await;

        if summary.submission.cancelled {
            summary.cancelled = true;
            summary.status = SheetStatus::error(format!("Upload cancelled for sheet: {sheet}"));
        }

        log_sheet_complete!(sheet, summary.submission.resources_uploaded, start_time.elapsed());
        finish(summary)
    }
}
