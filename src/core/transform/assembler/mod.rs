//! Resource assemblers
//!
//! Each assembler turns the staged values of one resource instance into a
//! typed FHIR resource. Composite elements are built field by field and
//! dropped when nothing ended up populated. A value that cannot be coerced is
//! logged and leaves its field unset; only a missing identity fails assembly.

pub mod condition;
pub mod patient;
pub mod practitioner;
pub mod reference;

pub use condition::assemble_condition;
pub use patient::assemble_patient;
pub use practitioner::assemble_practitioner;
pub use reference::{BareStrategy, LookupSession, ReferenceParts};

use super::path::{
    AddressField, IdentifierField, MetaField, NameField, ReferenceField, TelecomField,
};
use super::staged::{StagedValue, StagedValueSet};
use crate::domain::datatypes::{
    non_empty, Address, CodeableConcept, ContactPoint, Coding, HumanName, Identifier, Meta,
};
use std::hash::Hash;

fn text(value: Option<&StagedValue>) -> Option<String> {
    value.map(StagedValue::text)
}

fn code(value: Option<&StagedValue>) -> Option<String> {
    value.and_then(StagedValue::code)
}

fn coding(value: Option<&StagedValue>) -> Option<Coding> {
    value.and_then(StagedValue::coding)
}

fn concept(value: Option<&StagedValue>) -> Option<CodeableConcept> {
    value.and_then(StagedValue::codeable_concept)
}

fn boolean(value: Option<&StagedValue>, element: &str) -> Option<bool> {
    let value = value?;
    let parsed = value.boolean();
    if parsed.is_none() {
        tracing::debug!(element = %element, value = %value.text(), "Value is not a boolean, field left unset");
    }
    parsed
}

fn date(value: Option<&StagedValue>, element: &str) -> Option<String> {
    match value?.date() {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!(element = %element, error = %e, "Date coercion failed, field left unset");
            None
        }
    }
}

fn number(value: Option<&StagedValue>, element: &str) -> Option<f64> {
    match value?.number() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(element = %element, error = %e, "Numeric coercion failed, field left unset");
            None
        }
    }
}

fn rank(value: Option<&StagedValue>) -> Option<u32> {
    let n = number(value, "telecom.rank")?;
    if n.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(&n) {
        Some(n as u32)
    } else {
        tracing::warn!(value = n, "ContactPoint.rank must be a positive integer, field left unset");
        None
    }
}

/// `meta`, with the configured profile first in `meta.profile`
fn build_meta<F, W>(set: &StagedValueSet<F>, wrap: W, profile: Option<&str>) -> Option<Meta>
where
    F: Eq + Hash,
    W: Fn(MetaField) -> F,
{
    let get = |field| set.get(&wrap(field));

    let mut profiles: Vec<String> = profile.map(str::to_string).into_iter().collect();
    profiles.extend(text(get(MetaField::Profile)));

    non_empty(Meta {
        version_id: text(get(MetaField::VersionId)),
        source: text(get(MetaField::Source)),
        profile: profiles,
        security: coding(get(MetaField::Security)).into_iter().collect(),
        tag: coding(get(MetaField::Tag)).into_iter().collect(),
    })
}

fn build_identifier<F, W>(set: &StagedValueSet<F>, wrap: W) -> Option<Identifier>
where
    F: Eq + Hash,
    W: Fn(IdentifierField) -> F,
{
    let get = |field| set.get(&wrap(field));

    non_empty(Identifier {
        use_: None,
        system: text(get(IdentifierField::System)),
        value: text(get(IdentifierField::Value)),
    })
}

fn build_name<F, W>(set: &StagedValueSet<F>, wrap: W) -> Option<HumanName>
where
    F: Eq + Hash,
    W: Fn(NameField) -> F,
{
    let get = |field| set.get(&wrap(field));

    non_empty(HumanName {
        use_: code(get(NameField::Use)),
        text: text(get(NameField::Text)),
        family: text(get(NameField::Family)),
        given: text(get(NameField::Given)).into_iter().collect(),
        prefix: text(get(NameField::Prefix)).into_iter().collect(),
        suffix: text(get(NameField::Suffix)).into_iter().collect(),
    })
}

fn build_telecom<F, W>(set: &StagedValueSet<F>, wrap: W) -> Option<ContactPoint>
where
    F: Eq + Hash,
    W: Fn(TelecomField) -> F,
{
    let get = |field| set.get(&wrap(field));

    non_empty(ContactPoint {
        system: code(get(TelecomField::System)),
        value: text(get(TelecomField::Value)),
        use_: code(get(TelecomField::Use)),
        rank: rank(get(TelecomField::Rank)),
    })
}

fn build_address<F, W>(set: &StagedValueSet<F>, wrap: W) -> Option<Address>
where
    F: Eq + Hash,
    W: Fn(AddressField) -> F,
{
    let get = |field| set.get(&wrap(field));

    non_empty(Address {
        use_: code(get(AddressField::Use)),
        type_: code(get(AddressField::Type)),
        text: text(get(AddressField::Text)),
        line: text(get(AddressField::Line)).into_iter().collect(),
        city: text(get(AddressField::City)),
        district: text(get(AddressField::District)),
        state: text(get(AddressField::State)),
        postal_code: text(get(AddressField::PostalCode)),
        country: text(get(AddressField::Country)),
    })
}

/// Staged values feeding one reference element
fn reference_parts<F, W>(set: &StagedValueSet<F>, bare: F, wrap: W) -> ReferenceParts<'_>
where
    F: Eq + Hash,
    W: Fn(ReferenceField) -> F,
{
    ReferenceParts {
        bare: set.get(&bare),
        reference: set.get(&wrap(ReferenceField::Reference)),
        identifier: set.get(&wrap(ReferenceField::Identifier)),
        display: set.get(&wrap(ReferenceField::Display)),
    }
}
