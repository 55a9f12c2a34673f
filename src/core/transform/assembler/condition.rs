//! Condition assembly
//!
//! One Condition is assembled per group of staged values. The subject and
//! encounter columns are taken as server ids (`Patient/{value}`), recorder and
//! asserter are looked up by identifier. Identity is derived from
//! `subject.reference + code + onsetDateTime + abatementDateTime` unless an
//! explicit `id` is mapped.

use super::reference::{self, BareStrategy, LookupSession};
use super::{build_identifier, build_meta, concept, date, number, reference_parts, text};
use crate::core::transform::identity;
use crate::core::transform::path::{AgeField, ConditionField, PeriodField};
use crate::core::transform::staged::StagedValueSet;
use crate::domain::datatypes::{non_empty, Age, Period};
use crate::domain::{Condition, ResourceKind, Result};

/// Build a Condition from one group's staged values
pub async fn assemble_condition(
    set: &StagedValueSet<ConditionField>,
    profile: Option<&str>,
    session: &LookupSession,
) -> Result<Condition> {
    use ConditionField as C;

    let subject = reference::resolve(
        session,
        ResourceKind::Patient,
        BareStrategy::Literal,
        reference_parts(set, C::Subject, C::SubjectRef),
    )
    .await;
    let code = concept(set.get(&C::Code));
    let onset_date_time = date(set.get(&C::OnsetDateTime), "Condition.onsetDateTime");
    let abatement_date_time = date(
        set.get(&C::AbatementDateTime),
        "Condition.abatementDateTime",
    );

    let id = identity::condition_id(
        text(set.get(&C::Id)).as_deref(),
        subject.as_ref().and_then(|s| s.reference.as_deref()),
        code.as_ref().and_then(|c| c.first_code()),
        onset_date_time.as_deref(),
        abatement_date_time.as_deref(),
    )?;

    let encounter = reference::resolve(
        session,
        ResourceKind::Encounter,
        BareStrategy::Literal,
        reference_parts(set, C::Encounter, C::EncounterRef),
    )
    .await;
    let recorder = reference::resolve(
        session,
        ResourceKind::Practitioner,
        BareStrategy::Lookup,
        reference_parts(set, C::Recorder, C::RecorderRef),
    )
    .await;
    let asserter = reference::resolve(
        session,
        ResourceKind::Practitioner,
        BareStrategy::Lookup,
        reference_parts(set, C::Asserter, C::AsserterRef),
    )
    .await;

    let abatement_period = non_empty(Period {
        start: date(
            set.get(&C::AbatementPeriod(PeriodField::Start)),
            "Condition.abatementPeriod.start",
        ),
        end: date(
            set.get(&C::AbatementPeriod(PeriodField::End)),
            "Condition.abatementPeriod.end",
        ),
    });

    let age = |field| set.get(&C::AbatementAge(field));
    let abatement_age = non_empty(Age {
        value: number(age(AgeField::Value), "Condition.abatementAge.value"),
        comparator: text(age(AgeField::Comparator)),
        unit: text(age(AgeField::Unit)),
        system: text(age(AgeField::System)),
        code: text(age(AgeField::Code)),
    });

    Ok(Condition {
        id,
        meta: build_meta(set, C::Meta, profile),
        identifier: build_identifier(set, C::Identifier).into_iter().collect(),
        clinical_status: concept(set.get(&C::ClinicalStatus)),
        verification_status: concept(set.get(&C::VerificationStatus)),
        category: concept(set.get(&C::Category)).into_iter().collect(),
        severity: concept(set.get(&C::Severity)),
        code,
        body_site: concept(set.get(&C::BodySite)).into_iter().collect(),
        subject,
        encounter,
        onset_date_time,
        abatement_date_time,
        abatement_age,
        abatement_period,
        abatement_string: text(set.get(&C::AbatementString)),
        recorded_date: date(set.get(&C::RecordedDate), "Condition.recordedDate"),
        recorder,
        asserter,
    })
}
