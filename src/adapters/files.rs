//! JSON file inputs
//!
//! The CLI reads the mapping document and the parsed rows from JSON files.
//! Row data has the shape `{ "<sheet>": [ { "<column>": <value> } ] }`.

use crate::domain::context::ResultExt;
use crate::domain::{MappingDocument, Result, TabulaError, Workbook};
use std::path::Path;

/// Read and validate a mapping document
pub fn load_mapping(path: impl AsRef<Path>) -> Result<MappingDocument> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file {}", path.display()))?;

    let document: MappingDocument = serde_json::from_str(&contents)
        .map_err(|e| TabulaError::Mapping(format!("{}: {e}", path.display())))?;

    document
        .validate()
        .map_err(|e| TabulaError::Mapping(format!("{}: {e}", path.display())))?;

    tracing::debug!(
        path = %path.display(),
        sheets = document.sheets.len(),
        concept_maps = document.concept_maps.len(),
        "Loaded mapping document"
    );
    Ok(document)
}

/// Read parsed rows for every sheet
pub fn load_rows(path: impl AsRef<Path>) -> Result<Workbook> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read row data {}", path.display()))?;

    let workbook: Workbook = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid row data in {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        sheets = workbook.len(),
        rows = workbook.values().map(Vec::len).sum::<usize>(),
        "Loaded row data"
    );
    Ok(workbook)
}
