//! Mapping document model
//!
//! A mapping document binds source columns of each sheet to one or more FHIR
//! target paths. Target paths stay strings here; they are parsed into typed
//! fields when a sheet's rules are compiled (see `core::transform::path`).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Declared type of a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Free text
    #[default]
    #[serde(alias = "s", alias = "string", alias = "Text", alias = "String")]
    Text,
    /// Number (a date serial when the column is a date column)
    #[serde(alias = "n", alias = "Number")]
    Number,
    /// Boolean
    #[serde(alias = "b", alias = "bool", alias = "Boolean")]
    Boolean,
    /// Calendar date
    #[serde(alias = "d", alias = "Date")]
    Date,
}

/// One destination of a mapping rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// `ResourceKind.field[.NestedType.subfield]*`
    pub target_path: String,

    /// Correlates several Condition columns of one row into one resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,

    /// Fixed code system used for coded targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_uri: Option<String>,

    /// Name of a concept map declared in the mapping document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_map: Option<String>,
}

impl Target {
    /// Create a target with only a path
    pub fn new(target_path: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            group_key: None,
            fixed_uri: None,
            concept_map: None,
        }
    }

    /// Set the group key
    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    /// Set the fixed code system
    pub fn with_fixed_uri(mut self, uri: impl Into<String>) -> Self {
        self.fixed_uri = Some(uri.into());
        self
    }

    /// Attach a concept map by name
    pub fn with_concept_map(mut self, name: impl Into<String>) -> Self {
        self.concept_map = Some(name.into());
        self
    }
}

/// Binds one source column to one or more targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    /// Column header in the sheet
    pub source_column: String,

    /// Declared type of the column
    #[serde(default)]
    pub value_type: TypeTag,

    /// Destinations for the column's value
    pub targets: Vec<Target>,
}

impl MappingRule {
    /// Create a rule for a column
    pub fn new(source_column: impl Into<String>, value_type: TypeTag) -> Self {
        Self {
            source_column: source_column.into(),
            value_type,
            targets: Vec::new(),
        }
    }

    /// Add a target
    pub fn target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }
}

/// Value translation table from source values to target codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMap {
    /// Code system of the translated codes, used when the target has no fixed URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_system: Option<String>,

    /// Source value to target code
    #[serde(default)]
    pub mappings: HashMap<String, String>,
}

impl ConceptMap {
    /// Translate a source value
    ///
    /// Exact match first, then a trimmed, case-insensitive match.
    pub fn translate(&self, source: &str) -> Option<&str> {
        if let Some(target) = self.mappings.get(source) {
            return Some(target.as_str());
        }
        let needle = source.trim();
        self.mappings
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(needle))
            .map(|(_, v)| v.as_str())
    }
}

/// Complete mapping document for one source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDocument {
    /// Rules per sheet name
    pub sheets: BTreeMap<String, Vec<MappingRule>>,

    /// Named concept maps referenced by targets
    #[serde(default)]
    pub concept_maps: HashMap<String, ConceptMap>,
}

impl MappingDocument {
    /// Check structural constraints that serde can't express
    ///
    /// Unknown target paths and concept map names are not errors here; they
    /// are reported when a sheet's rules are compiled.
    pub fn validate(&self) -> Result<(), String> {
        if self.sheets.is_empty() {
            return Err("mapping document declares no sheets".to_string());
        }
        for (sheet, rules) in &self.sheets {
            for rule in rules {
                if rule.source_column.is_empty() {
                    return Err(format!("sheet '{sheet}': rule with empty sourceColumn"));
                }
                if rule.targets.iter().any(|t| t.target_path.trim().is_empty()) {
                    return Err(format!(
                        "sheet '{sheet}': column '{}' has an empty targetPath",
                        rule.source_column
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_mapping_document() {
        let json = r#"{
            "sheets": {
                "Conditions": [
                    {
                        "sourceColumn": "Code",
                        "valueType": "s",
                        "targets": [
                            {"targetPath": "Condition.code", "groupKey": "A", "fixedUri": "http://snomed.info/sct"}
                        ]
                    },
                    {
                        "sourceColumn": "Sex",
                        "targets": [{"targetPath": "Patient.gender", "conceptMap": "gender"}]
                    }
                ]
            },
            "conceptMaps": {
                "gender": {"mappings": {"M": "male", "F": "female"}}
            }
        }"#;

        let doc: MappingDocument = serde_json::from_str(json).unwrap();
        let rules = &doc.sheets["Conditions"];
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].value_type, TypeTag::Text);
        assert_eq!(rules[0].targets[0].group_key.as_deref(), Some("A"));
        assert_eq!(rules[1].value_type, TypeTag::Text);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_type_tag_aliases() {
        let tags: Vec<TypeTag> = serde_json::from_str(r#"["d", "Date", "n", "b", "string"]"#).unwrap();
        assert_eq!(
            tags,
            vec![
                TypeTag::Date,
                TypeTag::Date,
                TypeTag::Number,
                TypeTag::Boolean,
                TypeTag::Text
            ]
        );
    }

    #[test]
    fn test_concept_map_translate() {
        let mut map = ConceptMap::default();
        map.mappings.insert("M".to_string(), "male".to_string());

        assert_eq!(map.translate("M"), Some("male"));
        assert_eq!(map.translate(" m "), Some("male"));
        assert_eq!(map.translate("X"), None);
    }

    #[test]
    fn test_validate_empty_source_column() {
        let mut doc = MappingDocument::default();
        doc.sheets.insert(
            "S".to_string(),
            vec![MappingRule::new("", TypeTag::Text).target(Target::new("Patient.gender"))],
        );
        let err = doc.validate().unwrap_err();
        assert!(err.contains("empty sourceColumn"));
    }

    #[test]
    fn test_validate_empty_target_path() {
        let mut doc = MappingDocument::default();
        doc.sheets.insert(
            "S".to_string(),
            vec![MappingRule::new("Col", TypeTag::Text).target(Target::new(" "))],
        );
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_validate_empty_document() {
        assert!(MappingDocument::default().validate().is_err());
    }
}
