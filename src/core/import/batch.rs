//! Batch submission
//!
//! A sheet's resources are cut into chunks of at most `chunk_size` and
//! uploaded one chunk at a time. Every upload holds a permit from a semaphore
//! shared by all sheets, which bounds how many batch bundles are in flight
//! against the server. A chunk that still fails after its retries is logged
//! and skipped; the remaining chunks are still submitted.

use crate::adapters::fhir::LookupService;
use crate::config::RetryConfig;
use crate::domain::{Resource, Result, TabulaError};
use crate::{log_chunk_upload, log_retry_attempt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

/// Outcome of submitting one sheet's resources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Chunks accepted by the server (or counted in dry-run mode)
    pub chunks_submitted: usize,
    /// Chunks that failed after all attempts
    pub chunks_failed: usize,
    /// Chunks never attempted because of a shutdown signal
    pub chunks_skipped: usize,
    /// Resources in submitted chunks
    pub resources_uploaded: usize,
    /// Resources in failed or skipped chunks
    pub resources_dropped: usize,
    /// Whether submission stopped early on a shutdown signal
    pub cancelled: bool,
}

impl SubmissionReport {
    /// Total chunks the resources were cut into
    pub fn total_chunks(&self) -> usize {
        self.chunks_submitted + self.chunks_failed + self.chunks_skipped
    }

    /// Whether every chunk made it to the server
    pub fn is_complete(&self) -> bool {
        self.chunks_failed == 0 && self.chunks_skipped == 0
    }
}

/// Number of chunks `len` resources are cut into
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

/// Sequential chunk uploader
pub struct BatchSubmitter {
    service: Arc<dyn LookupService>,
    uploads: Arc<Semaphore>,
    chunk_size: usize,
    retry: RetryConfig,
    dry_run: bool,
}

impl BatchSubmitter {
    /// Create a submitter sharing the given upload slots
    pub fn new(service: Arc<dyn LookupService>, uploads: Arc<Semaphore>, chunk_size: usize) -> Self {
        Self {
            service,
            uploads,
            chunk_size: chunk_size.max(1),
            retry: RetryConfig::default(),
            dry_run: false,
        }
    }

    /// Retry policy applied to each chunk
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Count chunks without uploading
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Upload resources chunk by chunk
    ///
    /// Chunk `i + 1` is not started before chunk `i` settles. The shutdown
    /// signal is checked before each chunk; once set, the remaining chunks are
    /// skipped.
    pub async fn submit(
        &self,
        sheet: &str,
        resources: &[Resource],
        shutdown: &watch::Receiver<bool>,
    ) -> SubmissionReport {
        let mut report = SubmissionReport::default();
        if resources.is_empty() {
            return report;
        }

        let chunks = chunk_count(resources.len(), self.chunk_size);
        for (index, chunk) in resources.chunks(self.chunk_size).enumerate() {
            if *shutdown.borrow() {
                let remaining = &resources[index * self.chunk_size..];
                report.cancelled = true;
                report.chunks_skipped = chunks - index;
                report.resources_dropped += remaining.len();
                tracing::warn!(
                    sheet = %sheet,
                    skipped_chunks = report.chunks_skipped,
                    skipped_resources = remaining.len(),
                    "Shutdown signal received, skipping remaining chunks"
                );
                break;
            }

            log_chunk_upload!(sheet, index + 1, chunks, chunk.len());

            if self.dry_run {
                tracing::info!(sheet = %sheet, chunk = index + 1, size = chunk.len(), "Dry run: chunk not uploaded");
                report.chunks_submitted += 1;
                report.resources_uploaded += chunk.len();
                continue;
            }

            match self.upload_with_retry(chunk).await {
                Ok(()) => {
                    report.chunks_submitted += 1;
                    report.resources_uploaded += chunk.len();
                }
                Err(e) => {
                    tracing::error!(
                        sheet = %sheet,
                        chunk = index + 1,
                        chunks = chunks,
                        size = chunk.len(),
                        error = %e,
                        "Chunk upload failed, skipping"
                    );
                    report.chunks_failed += 1;
                    report.resources_dropped += chunk.len();
                }
            }
        }

        report
    }

    async fn upload(&self, chunk: &[Resource]) -> Result<()> {
        let _permit = self
            .uploads
            .acquire()
            .await
            .map_err(|e| TabulaError::Other(format!("Upload slots closed: {e}")))?;
        self.service.post_batch(chunk).await
    }

    /// Upload one chunk, retrying transient server failures with exponential backoff
    async fn upload_with_retry(&self, chunk: &[Resource]) -> Result<()> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.upload(chunk).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    let retryable =
                        matches!(&e, TabulaError::FhirServer(server) if server.is_retryable());
                    if !retryable || attempt >= max_attempts {
                        return Err(e);
                    }

                    let delay_ms = backoff_delay_ms(&self.retry, attempt);
                    log_retry_attempt!(attempt + 1, max_attempts, e);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`
fn backoff_delay_ms(retry: &RetryConfig, attempt: usize) -> u64 {
    let factor = retry.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
    let delay = (retry.initial_delay_ms as f64 * factor).min(retry.max_delay_ms as f64);
    delay as u64
}
