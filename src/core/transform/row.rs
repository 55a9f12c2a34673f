//! Row transformation
//!
//! A row is staged once against the compiled rules of its sheet, then every
//! resource instance it describes is assembled: at most one Patient, at most
//! one Practitioner, and one Condition per group. Condition values without a
//! declared group share a group minted for the row.

use super::assembler::{
    assemble_condition, assemble_patient, assemble_practitioner, LookupSession,
};
use super::path::{ConditionField, PatientField, PractitionerField, TargetField};
use super::resolver::{self, CompiledRule};
use super::staged::StagedValueSet;
use crate::config::ProfilesConfig;
use crate::domain::{Resource, ResourceKind, Result, Row, TabulaError};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tokio::sync::watch;
use uuid::Uuid;

/// Condition group a staged value belongs to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupKey {
    /// `groupKey` declared on the mapping target
    Declared(String),
    /// Minted for the row's undeclared Condition targets
    Synthetic(Uuid),
}

/// Staged values of one row, per resource instance
#[derive(Debug, Default)]
pub struct StagedRow {
    pub patient: StagedValueSet<PatientField>,
    pub practitioner: StagedValueSet<PractitionerField>,
    pub conditions: BTreeMap<GroupKey, StagedValueSet<ConditionField>>,
}

/// Stage every non-empty cell of a row
pub fn stage_row(row: &Row, rules: &[CompiledRule]) -> StagedRow {
    let mut staged = StagedRow::default();
    let mut synthetic: Option<Uuid> = None;

    for rule in rules {
        for target in &rule.targets {
            let Some(value) = resolver::resolve(row, rule, target) else {
                continue;
            };

            match target.field {
                TargetField::Patient(field) => staged.patient.insert(field, value),
                TargetField::Practitioner(field) => staged.practitioner.insert(field, value),
                TargetField::Condition(field) => {
                    let key = match &target.group_key {
                        Some(key) => GroupKey::Declared(key.clone()),
                        None => GroupKey::Synthetic(*synthetic.get_or_insert_with(Uuid::new_v4)),
                    };
                    staged.conditions.entry(key).or_default().insert(field, value);
                }
            }
        }
    }

    staged
}

/// Keep an assembled resource; drop it if it only failed on its own identity
fn keep<R: Into<Resource>>(
    kind: ResourceKind,
    result: Result<R>,
    resources: &mut Vec<Resource>,
) -> Result<()> {
    match result {
        Ok(resource) => {
            resources.push(resource.into());
            Ok(())
        }
        Err(e) if e.is_resource_local() => {
            tracing::warn!(resource_type = %kind, error = %e, "Resource dropped");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Assemble every resource described by one row
///
/// Condition groups are assembled concurrently and independently; a group
/// without identity is dropped without affecting its siblings.
pub async fn transform_row(
    row: &Row,
    rules: &[CompiledRule],
    profiles: &ProfilesConfig,
    session: &LookupSession,
) -> Result<Vec<Resource>> {
    let staged = stage_row(row, rules);
    let mut resources = Vec::new();

    if !staged.patient.is_empty() {
        let profile = profiles.for_kind(ResourceKind::Patient);
        let patient = assemble_patient(&staged.patient, profile, session).await;
        keep(ResourceKind::Patient, patient, &mut resources)?;
    }

    if !staged.practitioner.is_empty() {
        let profile = profiles.for_kind(ResourceKind::Practitioner);
        let practitioner = assemble_practitioner(&staged.practitioner, profile);
        keep(ResourceKind::Practitioner, practitioner, &mut resources)?;
    }

    let profile = profiles.for_kind(ResourceKind::Condition);
    let conditions = join_all(
        staged
            .conditions
            .values()
            .map(|set| assemble_condition(set, profile, session)),
    )
    .await;
    for condition in conditions {
        keep(ResourceKind::Condition, condition, &mut resources)?;
    }

    Ok(resources)
}

/// Resources produced by a sheet's rows
#[derive(Debug, Default)]
pub struct SheetOutput {
    pub resources: Vec<Resource>,
    pub rows_transformed: usize,
    pub rows_failed: usize,
}

/// Transform all rows of a sheet with bounded concurrency
///
/// A failed row is logged and its partial resources discarded. The shutdown
/// signal is checked as each row completes; once set, in-flight rows are
/// abandoned and [`TabulaError::Cancelled`] is returned.
pub async fn transform_rows(
    sheet: &str,
    rows: &[Row],
    rules: &[CompiledRule],
    profiles: &ProfilesConfig,
    session: &LookupSession,
    concurrency: usize,
    shutdown: &watch::Receiver<bool>,
) -> Result<SheetOutput> {
    let mut output = SheetOutput::default();

    let mut results = stream::iter(rows.iter().enumerate())
        .map(|(index, row)| async move { (index, transform_row(row, rules, profiles, session).await) })
        .buffer_unordered(concurrency.max(1));

    while let Some((index, result)) = results.next().await {
        if *shutdown.borrow() {
            tracing::warn!(sheet = %sheet, completed = output.rows_transformed, "Shutdown signal received, abandoning sheet");
            return Err(TabulaError::Cancelled(format!(
                "Transform cancelled for sheet: {sheet}"
            )));
        }

        match result {
            Ok(resources) => {
                output.rows_transformed += 1;
                output.resources.extend(resources);
            }
            Err(e) => {
                output.rows_failed += 1;
                tracing::error!(sheet = %sheet, row = index, error = %e, "Row transformation failed");
            }
        }
    }

    Ok(output)
}
