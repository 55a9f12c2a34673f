//! Logging and observability
//!
//! Structured logging via `tracing`:
//! - human-readable or JSON console output
//! - configurable log levels (overridable with `RUST_LOG`)
//! - local JSON log files with rotation
//!
//! # Example
//!
//! ```no_run
//! use tabula::logging::init_logging;
//! use tabula::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(sheet = "Conditions", "Import started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a sheet import
///
/// # Example
///
/// ```no_run
/// use tabula::log_sheet_start;
///
/// log_sheet_start!("Conditions", 1200);
/// ```
#[macro_export]
macro_rules! log_sheet_start {
    ($sheet:expr, $rows:expr) => {
        tracing::info!(sheet = %$sheet, rows = $rows, "Starting sheet import");
    };
}

/// Log the completion of a sheet import
///
/// # Example
///
/// ```no_run
/// use tabula::log_sheet_complete;
/// use std::time::Duration;
///
/// log_sheet_complete!("Conditions", 1180, Duration::from_secs(12));
/// ```
#[macro_export]
macro_rules! log_sheet_complete {
    ($sheet:expr, $resources:expr, $duration:expr) => {
        tracing::info!(
            sheet = %$sheet,
            resources = $resources,
            duration_ms = $duration.as_millis(),
            "Sheet import completed"
        );
    };
}

/// Log one chunk upload
///
/// # Example
///
/// ```no_run
/// use tabula::log_chunk_upload;
///
/// log_chunk_upload!("Conditions", 2, 3, 5000);
/// ```
#[macro_export]
macro_rules! log_chunk_upload {
    ($sheet:expr, $chunk:expr, $chunks:expr, $size:expr) => {
        tracing::debug!(
            sheet = %$sheet,
            chunk = $chunk,
            chunks = $chunks,
            size = $size,
            "Uploading chunk"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use tabula::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
