//! Domain models and types for Tabula.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Input model** ([`Row`], [`CellValue`], [`MappingDocument`])
//! - **FHIR model** ([`Resource`] and the datatypes in [`datatypes`])
//! - **Strongly-typed identifiers** ([`ResourceId`])
//! - **Error types** ([`TabulaError`], [`FhirServerError`])
//! - **Result type alias** ([`Result`])
//!
//! All fallible operations return [`Result<T, TabulaError>`]:
//!
//! ```rust
//! use tabula::domain::{MappingDocument, Result};
//!
//! fn parse(json: &str) -> Result<MappingDocument> {
//!     Ok(serde_json::from_str(json)?)
//! }
//! ```

pub mod context;
pub mod datatypes;
pub mod errors;
pub mod ids;
pub mod mapping;
pub mod resources;
pub mod result;
pub mod row;

// Re-export commonly used types for convenience
pub use errors::{FhirServerError, TabulaError};
pub use ids::ResourceId;
pub use mapping::{ConceptMap, MappingDocument, MappingRule, Target, TypeTag};
pub use resources::{Condition, Patient, Practitioner, Resource, ResourceKind};
pub use result::Result;
pub use row::{CellValue, Row, Workbook};
