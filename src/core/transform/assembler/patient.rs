//! Patient assembly

use super::reference::{self, BareStrategy, LookupSession};
use super::{
    boolean, build_address, build_identifier, build_meta, build_name, build_telecom, code, date,
    reference_parts, text,
};
use crate::core::transform::identity;
use crate::core::transform::path::PatientField;
use crate::core::transform::staged::StagedValueSet;
use crate::domain::{Patient, ResourceKind, Result};

/// Build a Patient from its staged values
///
/// `generalPractitioner` is resolved by searching for a Practitioner with the
/// staged identifier; an unresolved practitioner leaves the element out.
///
/// # Errors
///
/// [`TabulaError::MissingIdentity`](crate::domain::TabulaError::MissingIdentity)
/// when neither `id` nor `identifier` is mapped.
pub async fn assemble_patient(
    set: &StagedValueSet<PatientField>,
    profile: Option<&str>,
    session: &LookupSession,
) -> Result<Patient> {
    let identifier = build_identifier(set, PatientField::Identifier);
    let id = identity::person_id(
        ResourceKind::Patient,
        text(set.get(&PatientField::Id)).as_deref(),
        identifier.as_ref(),
    )?;

    let general_practitioner = reference::resolve(
        session,
        ResourceKind::Practitioner,
        BareStrategy::Lookup,
        reference_parts(
            set,
            PatientField::GeneralPractitioner,
            PatientField::GeneralPractitionerRef,
        ),
    )
    .await;

    Ok(Patient {
        id,
        meta: build_meta(set, PatientField::Meta, profile),
        identifier: identifier.into_iter().collect(),
        active: boolean(set.get(&PatientField::Active), "Patient.active"),
        name: build_name(set, PatientField::Name).into_iter().collect(),
        telecom: build_telecom(set, PatientField::Telecom).into_iter().collect(),
        gender: code(set.get(&PatientField::Gender)),
        birth_date: date(set.get(&PatientField::BirthDate), "Patient.birthDate"),
        deceased_boolean: boolean(
            set.get(&PatientField::DeceasedBoolean),
            "Patient.deceasedBoolean",
        ),
        deceased_date_time: date(
            set.get(&PatientField::DeceasedDateTime),
            "Patient.deceasedDateTime",
        ),
        address: build_address(set, PatientField::Address).into_iter().collect(),
        general_practitioner: general_practitioner.into_iter().collect(),
    })
}
