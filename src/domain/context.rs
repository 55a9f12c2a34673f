//! Error context extension trait
//!
//! `anyhow::Context` for library code: attaches a message to any error that
//! converts into [`TabulaError`] without leaving the domain error type.
//!
//! ```rust
//! use tabula::domain::Result;
//! use tabula::domain::context::ResultExt;
//!
//! fn read_mapping(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read mapping file {path}"))
//! }
//! ```

use crate::domain::errors::TabulaError;
use crate::domain::result::Result;

/// Adds `.context()` and `.with_context()` to results
pub trait ResultExt<T> {
    /// Add an eagerly evaluated context message
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    /// Add a context message computed only on error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<TabulaError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Configuration errors keep their variant so the CLI can still map them to
// the configuration exit code.
fn wrap(err: TabulaError, context: impl std::fmt::Display) -> TabulaError {
    match err {
        TabulaError::Configuration(msg) => TabulaError::Configuration(format!("{context}: {msg}")),
        other => TabulaError::Other(format!("{context}: {other}")),
    }
}
