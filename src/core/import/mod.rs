//! Import orchestration
//!
//! - [`coordinator`] - runs every sheet of a mapping document
//! - [`batch`] - chunked, bounded upload of a sheet's resources
//! - [`summary`] - progress events and per-sheet results

pub mod batch;
pub mod coordinator;
pub mod summary;

pub use batch::{chunk_count, BatchSubmitter, SubmissionReport};
pub use coordinator::ImportCoordinator;
pub use summary::{ImportSummary, SheetEvent, SheetEventKind, SheetStatus, SheetSummary};
