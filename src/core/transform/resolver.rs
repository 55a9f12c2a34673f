//! Attribute resolution
//!
//! Compiles a sheet's mapping rules once (target paths parsed, concept maps
//! looked up) and turns a row cell into a [`StagedValue`] per target.

use super::path::{self, TargetField};
use super::staged::StagedValue;
use crate::domain::{ConceptMap, MappingRule, Row, TypeTag};
use std::collections::HashMap;
use std::sync::Arc;

/// A mapping target with its path parsed
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTarget {
    pub field: TargetField,
    pub group_key: Option<String>,
    pub fixed_uri: Option<String>,
    pub concept_map: Option<Arc<ConceptMap>>,
}

/// A mapping rule with every recognised target compiled
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub source_column: String,
    pub value_type: TypeTag,
    pub targets: Vec<CompiledTarget>,
}

/// Compile the rules of one sheet
///
/// Unrecognised target paths are dropped (logged at debug). A target naming a
/// concept map the document does not declare is kept without a map.
pub fn compile_rules(
    sheet: &str,
    rules: &[MappingRule],
    concept_maps: &HashMap<String, ConceptMap>,
) -> Vec<CompiledRule> {
    let shared: HashMap<&str, Arc<ConceptMap>> = concept_maps
        .iter()
        .map(|(name, map)| (name.as_str(), Arc::new(map.clone())))
        .collect();

    rules
        .iter()
        .map(|rule| {
            let targets = rule
                .targets
                .iter()
                .filter_map(|target| {
                    let Some(field) = path::parse(&target.target_path) else {
                        tracing::debug!(
                            sheet = %sheet,
                            column = %rule.source_column,
                            target_path = %target.target_path,
                            "Ignoring unrecognised target path"
                        );
                        return None;
                    };

                    let concept_map = target.concept_map.as_deref().and_then(|name| {
                        let map = shared.get(name).cloned();
                        if map.is_none() {
                            tracing::warn!(
                                sheet = %sheet,
                                column = %rule.source_column,
                                concept_map = %name,
                                "Unknown concept map, target kept without translation"
                            );
                        }
                        map
                    });

                    if target.group_key.is_some() && !matches!(field, TargetField::Condition(_)) {
                        tracing::debug!(
                            sheet = %sheet,
                            target_path = %target.target_path,
                            "groupKey only applies to Condition targets, ignoring"
                        );
                    }

                    Some(CompiledTarget {
                        field,
                        group_key: target.group_key.clone(),
                        fixed_uri: target.fixed_uri.clone(),
                        concept_map,
                    })
                })
                .collect();

            CompiledRule {
                source_column: rule.source_column.clone(),
                value_type: rule.value_type,
                targets,
            }
        })
        .collect()
}

/// Stage a row's cell for one target
///
/// `None` when the column is absent, `null`, or whitespace-only text.
pub fn resolve(row: &Row, rule: &CompiledRule, target: &CompiledTarget) -> Option<StagedValue> {
    let cell = row.get(&rule.source_column)?;
    if cell.is_blank() {
        return None;
    }
    Some(StagedValue::new(
        cell.clone(),
        rule.value_type,
        target.fixed_uri.clone(),
        target.concept_map.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::path::{ConditionField, PatientField};
    use crate::domain::{CellValue, Target};

    fn rules() -> Vec<MappingRule> {
        vec![
            MappingRule::new("Code", TypeTag::Text).target(
                Target::new("Condition.code")
                    .with_group("A")
                    .with_fixed_uri("http://snomed.info/sct"),
            ),
            MappingRule::new("Sex", TypeTag::Text)
                .target(Target::new("Patient.gender").with_concept_map("gender"))
                .target(Target::new("Patient.maritalStatus")),
            MappingRule::new("Status", TypeTag::Text)
                .target(Target::new("Condition.clinicalStatus").with_concept_map("missing")),
        ]
    }

    fn maps() -> HashMap<String, ConceptMap> {
        let mut map = ConceptMap::default();
        map.mappings.insert("M".to_string(), "male".to_string());
        HashMap::from([("gender".to_string(), map)])
    }

    #[test]
    fn test_compile_drops_unknown_paths() {
        let compiled = compile_rules("S", &rules(), &maps());
        assert_eq!(compiled.len(), 3);
        assert_eq!(compiled[1].targets.len(), 1);
        assert_eq!(
            compiled[1].targets[0].field,
            TargetField::Patient(PatientField::Gender)
        );
        assert!(compiled[1].targets[0].concept_map.is_some());
    }

    #[test]
    fn test_compile_keeps_target_with_unknown_map() {
        let compiled = compile_rules("S", &rules(), &maps());
        let target = &compiled[2].targets[0];
        assert_eq!(
            target.field,
            TargetField::Condition(ConditionField::ClinicalStatus)
        );
        assert!(target.concept_map.is_none());
    }

    #[test]
    fn test_resolve_skips_missing_and_blank() {
        let compiled = compile_rules("S", &rules(), &maps());
        let rule = &compiled[0];
        let target = &rule.targets[0];

        assert!(resolve(&Row::new(), rule, target).is_none());
        assert!(resolve(&Row::new().with("Code", ""), rule, target).is_none());
        assert!(resolve(&Row::new().with("Code", "   "), rule, target).is_none());
        assert!(resolve(&Row::new().with("Code", CellValue::Null), rule, target).is_none());
    }

    #[test]
    fn test_resolve_stages_value() {
        let compiled = compile_rules("S", &rules(), &maps());
        let rule = &compiled[0];
        let target = &rule.targets[0];

        let staged = resolve(&Row::new().with("Code", "C1"), rule, target).unwrap();
        assert_eq!(staged.text(), "C1");
        assert_eq!(staged.system(), Some("http://snomed.info/sct"));
        assert_eq!(staged.source_type(), TypeTag::Text);
    }
}
