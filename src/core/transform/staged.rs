//! Staged values
//!
//! A [`StagedValue`] is one non-empty cell bound to one mapping target. It is
//! created by the attribute resolver and read by exactly one assembler, which
//! decides how to coerce it for the field it lands in.

use super::coerce;
use crate::domain::datatypes::{CodeableConcept, Coding};
use crate::domain::{CellValue, ConceptMap, Result, TypeTag};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// A raw cell value plus the metadata needed to interpret it
#[derive(Debug, Clone, PartialEq)]
pub struct StagedValue {
    raw: CellValue,
    source_type: TypeTag,
    fixed_system: Option<String>,
    concept_map: Option<Arc<ConceptMap>>,
}

impl StagedValue {
    /// Stage a cell
    pub fn new(
        raw: CellValue,
        source_type: TypeTag,
        fixed_system: Option<String>,
        concept_map: Option<Arc<ConceptMap>>,
    ) -> Self {
        Self {
            raw,
            source_type,
            fixed_system,
            concept_map,
        }
    }

    /// Raw cell value
    pub fn raw(&self) -> &CellValue {
        &self.raw
    }

    /// Declared type of the source column
    pub fn source_type(&self) -> TypeTag {
        self.source_type
    }

    /// Cell rendered as trimmed text
    pub fn text(&self) -> String {
        self.raw.as_text().trim().to_string()
    }

    /// Code value after concept-map translation
    ///
    /// `None` when a concept map is attached and has no entry for the value.
    pub fn code(&self) -> Option<String> {
        let text = self.text();
        match &self.concept_map {
            Some(map) => map.translate(&text).map(str::to_string),
            None => Some(text),
        }
    }

    /// Code system for coded values: the fixed URI, else the map's target system
    pub fn system(&self) -> Option<&str> {
        self.fixed_system.as_deref().or_else(|| {
            self.concept_map
                .as_ref()
                .and_then(|m| m.target_system.as_deref())
        })
    }

    /// Single-coding CodeableConcept
    pub fn codeable_concept(&self) -> Option<CodeableConcept> {
        self.code()
            .map(|code| CodeableConcept::from_code(self.system(), code))
    }

    /// Single Coding
    pub fn coding(&self) -> Option<Coding> {
        self.code().map(|code| Coding::new(self.system(), code))
    }

    /// Boolean, accepting `true/false/yes/no/1/0` after translation
    pub fn boolean(&self) -> Option<bool> {
        match (&self.raw, &self.concept_map) {
            (CellValue::Bool(b), None) => Some(*b),
            _ => self.code().and_then(|c| coerce::parse_bool(&c)),
        }
    }

    /// `YYYY-MM-DD` date string
    pub fn date(&self) -> Result<String> {
        coerce::to_date_string(&self.raw, self.source_type)
    }

    /// Numeric value
    pub fn number(&self) -> Result<f64> {
        coerce::to_number(&self.raw)
    }
}

/// Staged values for one resource instance, keyed by typed field
#[derive(Debug, Clone)]
pub struct StagedValueSet<F> {
    values: HashMap<F, StagedValue>,
}

impl<F> Default for StagedValueSet<F> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<F: Eq + Hash> StagedValueSet<F> {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a value; a later rule for the same field replaces an earlier one
    pub fn insert(&mut self, field: F, value: StagedValue) {
        self.values.insert(field, value);
    }

    /// Value staged for a field
    pub fn get(&self, field: &F) -> Option<&StagedValue> {
        self.values.get(field)
    }

    /// Whether a value is staged for a field
    pub fn contains(&self, field: &F) -> bool {
        self.values.contains_key(field)
    }

    /// Number of staged fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over staged fields
    pub fn iter(&self) -> impl Iterator<Item = (&F, &StagedValue)> {
        self.values.iter()
    }
}
