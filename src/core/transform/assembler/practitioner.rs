//! Practitioner assembly

use super::{
    boolean, build_address, build_identifier, build_meta, build_name, build_telecom, code, date,
    text,
};
use crate::core::transform::identity;
use crate::core::transform::path::PractitionerField;
use crate::core::transform::staged::StagedValueSet;
use crate::domain::{Practitioner, ResourceKind, Result};

/// Build a Practitioner from its staged values
pub fn assemble_practitioner(
    set: &StagedValueSet<PractitionerField>,
    profile: Option<&str>,
) -> Result<Practitioner> {
    let identifier = build_identifier(set, PractitionerField::Identifier);
    let id = identity::person_id(
        ResourceKind::Practitioner,
        text(set.get(&PractitionerField::Id)).as_deref(),
        identifier.as_ref(),
    )?;

    Ok(Practitioner {
        id,
        meta: build_meta(set, PractitionerField::Meta, profile),
        identifier: identifier.into_iter().collect(),
        active: boolean(set.get(&PractitionerField::Active), "Practitioner.active"),
        name: build_name(set, PractitionerField::Name).into_iter().collect(),
        telecom: build_telecom(set, PractitionerField::Telecom)
            .into_iter()
            .collect(),
        address: build_address(set, PractitionerField::Address)
            .into_iter()
            .collect(),
        gender: code(set.get(&PractitionerField::Gender)),
        birth_date: date(
            set.get(&PractitionerField::BirthDate),
            "Practitioner.birthDate",
        ),
    })
}
