//! Row to resource transformation
//!
//! The pipeline for one sheet:
//!
//! 1. [`resolver::compile_rules`] parses every target path of the sheet's
//!    mapping rules into a typed [`path::TargetField`] and attaches concept maps
//! 2. [`row::stage_row`] turns each non-empty cell into a [`staged::StagedValue`]
//!    and partitions values per resource instance (Condition groups included)
//! 3. the [`assembler`] for each kind builds the FHIR resource, resolving
//!    references through a [`LookupSession`] and deriving a deterministic id
//!    with [`identity`]
//!
//! [`row::transform_rows`] drives the whole thing with bounded concurrency.

pub mod assembler;
pub mod coerce;
pub mod identity;
pub mod path;
pub mod resolver;
pub mod row;
pub mod staged;

pub use assembler::{BareStrategy, LookupSession};
pub use resolver::{compile_rules, CompiledRule, CompiledTarget};
pub use row::{stage_row, transform_row, transform_rows, GroupKey, SheetOutput, StagedRow};
pub use staged::{StagedValue, StagedValueSet};
