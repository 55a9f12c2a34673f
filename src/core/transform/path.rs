//! Target path parsing
//!
//! Mapping documents address resource elements with string paths such as
//! `Patient.name.HumanName.given` or `Condition.onset[x]:onsetDateTime`. The
//! strings are parsed once, when a sheet's rules are compiled, into the typed
//! field enums below so assemblers match on variants instead of strings.

use crate::domain::ResourceKind;

/// `meta.Meta.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaField {
    VersionId,
    Source,
    Profile,
    Security,
    Tag,
}

/// `identifier.Identifier.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierField {
    System,
    Value,
}

/// `name.HumanName.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameField {
    Use,
    Text,
    Family,
    Given,
    Prefix,
    Suffix,
}

/// `telecom.ContactPoint.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelecomField {
    System,
    Value,
    Use,
    Rank,
}

/// `address.Address.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Use,
    Type,
    Text,
    Line,
    City,
    District,
    State,
    PostalCode,
    Country,
}

/// `<element>.Reference.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceField {
    Reference,
    Identifier,
    Display,
}

/// `abatement[x].Period.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodField {
    Start,
    End,
}

/// `abatement[x].Age.*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeField {
    Value,
    Comparator,
    Unit,
    System,
    Code,
}

/// Patient elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientField {
    Id,
    Meta(MetaField),
    Identifier(IdentifierField),
    Active,
    Name(NameField),
    Telecom(TelecomField),
    Gender,
    BirthDate,
    DeceasedBoolean,
    DeceasedDateTime,
    Address(AddressField),
    /// Bare `generalPractitioner`: Practitioner looked up by identifier
    GeneralPractitioner,
    GeneralPractitionerRef(ReferenceField),
}

/// Practitioner elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PractitionerField {
    Id,
    Meta(MetaField),
    Identifier(IdentifierField),
    Active,
    Name(NameField),
    Telecom(TelecomField),
    Address(AddressField),
    Gender,
    BirthDate,
}

/// Condition elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionField {
    Id,
    Meta(MetaField),
    Identifier(IdentifierField),
    ClinicalStatus,
    VerificationStatus,
    Category,
    Severity,
    Code,
    BodySite,
    /// Bare `subject`: literal `Patient/{value}`
    Subject,
    SubjectRef(ReferenceField),
    /// Bare `encounter`: literal `Encounter/{value}`
    Encounter,
    EncounterRef(ReferenceField),
    OnsetDateTime,
    AbatementDateTime,
    AbatementString,
    AbatementPeriod(PeriodField),
    AbatementAge(AgeField),
    RecordedDate,
    /// Bare `recorder`: Practitioner looked up by identifier
    Recorder,
    RecorderRef(ReferenceField),
    /// Bare `asserter`: Practitioner looked up by identifier
    Asserter,
    AsserterRef(ReferenceField),
}

/// A parsed target path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetField {
    Patient(PatientField),
    Practitioner(PractitionerField),
    Condition(ConditionField),
}

impl TargetField {
    /// Resource kind the field belongs to
    pub fn kind(&self) -> ResourceKind {
        match self {
            TargetField::Patient(_) => ResourceKind::Patient,
            TargetField::Practitioner(_) => ResourceKind::Practitioner,
            TargetField::Condition(_) => ResourceKind::Condition,
        }
    }
}

const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "string", "dateTime", "date", "integer", "decimal", "uri", "code",
];

/// Rewrite choice-type slices `field[x]:fieldType` as `field[x].type`
///
/// The slice name usually repeats the element name (`onset[x]:onsetDateTime`);
/// that prefix is dropped. Primitive type names get a lowercase first letter,
/// complex type names (`Period`, `Age`) keep their case.
pub fn normalize(path: &str) -> String {
    path.split('.')
        .map(|segment| match segment.split_once("[x]:") {
            Some((element, slice)) => {
                let type_name = slice.strip_prefix(element).unwrap_or(slice);
                format!("{element}[x].{}", normalize_type_name(type_name))
            }
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn normalize_type_name(type_name: &str) -> String {
    let mut chars = type_name.chars();
    let lowered = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };
    if PRIMITIVE_TYPES.contains(&lowered.as_str()) {
        lowered
    } else {
        type_name.to_string()
    }
}

/// Parse a target path; `None` when the path is not recognised
pub fn parse(path: &str) -> Option<TargetField> {
    let normalized = normalize(path.trim());
    let segments: Vec<&str> = normalized.split('.').collect();
    let (resource, rest) = segments.split_first()?;

    match *resource {
        "Patient" => parse_patient(rest).map(TargetField::Patient),
        "Practitioner" => parse_practitioner(rest).map(TargetField::Practitioner),
        "Condition" => parse_condition(rest).map(TargetField::Condition),
        _ => None,
    }
}

/// Sub-element of a complex type, with or without the type segment
/// (`name.HumanName.given` and `name.given` are equivalent).
fn sub<'a>(rest: &[&'a str], type_name: &str) -> Option<&'a str> {
    match rest {
        [t, field] if *t == type_name => Some(*field),
        [field] => Some(*field),
        _ => None,
    }
}

fn parse_meta(rest: &[&str]) -> Option<MetaField> {
    match sub(rest, "Meta")? {
        "versionId" => Some(MetaField::VersionId),
        "source" => Some(MetaField::Source),
        "profile" => Some(MetaField::Profile),
        "security" => Some(MetaField::Security),
        "tag" => Some(MetaField::Tag),
        _ => None,
    }
}

fn parse_identifier(rest: &[&str]) -> Option<IdentifierField> {
    match sub(rest, "Identifier")? {
        "system" => Some(IdentifierField::System),
        "value" => Some(IdentifierField::Value),
        _ => None,
    }
}

fn parse_name(rest: &[&str]) -> Option<NameField> {
    match sub(rest, "HumanName")? {
        "use" => Some(NameField::Use),
        "text" => Some(NameField::Text),
        "family" => Some(NameField::Family),
        "given" => Some(NameField::Given),
        "prefix" => Some(NameField::Prefix),
        "suffix" => Some(NameField::Suffix),
        _ => None,
    }
}

fn parse_telecom(rest: &[&str]) -> Option<TelecomField> {
    match sub(rest, "ContactPoint")? {
        "system" => Some(TelecomField::System),
        "value" => Some(TelecomField::Value),
        "use" => Some(TelecomField::Use),
        "rank" => Some(TelecomField::Rank),
        _ => None,
    }
}

fn parse_address(rest: &[&str]) -> Option<AddressField> {
    match sub(rest, "Address")? {
        "use" => Some(AddressField::Use),
        "type" => Some(AddressField::Type),
        "text" => Some(AddressField::Text),
        "line" => Some(AddressField::Line),
        "city" => Some(AddressField::City),
        "district" => Some(AddressField::District),
        "state" => Some(AddressField::State),
        "postalCode" => Some(AddressField::PostalCode),
        "country" => Some(AddressField::Country),
        _ => None,
    }
}

fn parse_reference(rest: &[&str]) -> Option<ReferenceField> {
    match sub(rest, "Reference")? {
        "reference" => Some(ReferenceField::Reference),
        "identifier" => Some(ReferenceField::Identifier),
        "display" => Some(ReferenceField::Display),
        _ => None,
    }
}

fn parse_period(rest: &[&str]) -> Option<PeriodField> {
    match rest {
        ["Period", "start"] => Some(PeriodField::Start),
        ["Period", "end"] => Some(PeriodField::End),
        _ => None,
    }
}

fn parse_age(rest: &[&str]) -> Option<AgeField> {
    match rest {
        ["Age", "value"] => Some(AgeField::Value),
        ["Age", "comparator"] => Some(AgeField::Comparator),
        ["Age", "unit"] => Some(AgeField::Unit),
        ["Age", "system"] => Some(AgeField::System),
        ["Age", "code"] => Some(AgeField::Code),
        _ => None,
    }
}

fn parse_patient(rest: &[&str]) -> Option<PatientField> {
    let (element, tail) = rest.split_first()?;
    match (*element, tail) {
        ("id", []) => Some(PatientField::Id),
        ("meta", t) => parse_meta(t).map(PatientField::Meta),
        ("identifier", t) => parse_identifier(t).map(PatientField::Identifier),
        ("active", []) => Some(PatientField::Active),
        ("name", t) => parse_name(t).map(PatientField::Name),
        ("telecom", t) => parse_telecom(t).map(PatientField::Telecom),
        ("gender", []) => Some(PatientField::Gender),
        ("birthDate", []) => Some(PatientField::BirthDate),
        ("deceased[x]", ["boolean"]) | ("deceasedBoolean", []) => {
            Some(PatientField::DeceasedBoolean)
        }
        ("deceased[x]", ["dateTime"]) | ("deceasedDateTime", []) => {
            Some(PatientField::DeceasedDateTime)
        }
        ("address", t) => parse_address(t).map(PatientField::Address),
        ("generalPractitioner", []) => Some(PatientField::GeneralPractitioner),
        ("generalPractitioner", t) => {
            parse_reference(t).map(PatientField::GeneralPractitionerRef)
        }
        _ => None,
    }
}

fn parse_practitioner(rest: &[&str]) -> Option<PractitionerField> {
    let (element, tail) = rest.split_first()?;
    match (*element, tail) {
        ("id", []) => Some(PractitionerField::Id),
        ("meta", t) => parse_meta(t).map(PractitionerField::Meta),
        ("identifier", t) => parse_identifier(t).map(PractitionerField::Identifier),
        ("active", []) => Some(PractitionerField::Active),
        ("name", t) => parse_name(t).map(PractitionerField::Name),
        ("telecom", t) => parse_telecom(t).map(PractitionerField::Telecom),
        ("address", t) => parse_address(t).map(PractitionerField::Address),
        ("gender", []) => Some(PractitionerField::Gender),
        ("birthDate", []) => Some(PractitionerField::BirthDate),
        _ => None,
    }
}

fn parse_condition(rest: &[&str]) -> Option<ConditionField> {
    let (element, tail) = rest.split_first()?;
    match (*element, tail) {
        ("id", []) => Some(ConditionField::Id),
        ("meta", t) => parse_meta(t).map(ConditionField::Meta),
        ("identifier", t) => parse_identifier(t).map(ConditionField::Identifier),
        ("clinicalStatus", []) => Some(ConditionField::ClinicalStatus),
        ("verificationStatus", []) => Some(ConditionField::VerificationStatus),
        ("category", []) => Some(ConditionField::Category),
        ("severity", []) => Some(ConditionField::Severity),
        ("code", []) => Some(ConditionField::Code),
        ("bodySite", []) => Some(ConditionField::BodySite),
        ("subject", []) => Some(ConditionField::Subject),
        ("subject", t) => parse_reference(t).map(ConditionField::SubjectRef),
        ("encounter", []) => Some(ConditionField::Encounter),
        ("encounter", t) => parse_reference(t).map(ConditionField::EncounterRef),
        ("onset[x]", []) | ("onset[x]", ["dateTime"]) | ("onsetDateTime", []) => {
            Some(ConditionField::OnsetDateTime)
        }
        ("abatement[x]", ["dateTime"]) | ("abatementDateTime", []) => {
            Some(ConditionField::AbatementDateTime)
        }
        ("abatement[x]", ["string"]) | ("abatementString", []) => {
            Some(ConditionField::AbatementString)
        }
        ("abatement[x]", t) => parse_period(t)
            .map(ConditionField::AbatementPeriod)
            .or_else(|| parse_age(t).map(ConditionField::AbatementAge)),
        ("recordedDate", []) => Some(ConditionField::RecordedDate),
        ("recorder", []) => Some(ConditionField::Recorder),
        ("recorder", t) => parse_reference(t).map(ConditionField::RecorderRef),
        ("asserter", []) => Some(ConditionField::Asserter),
        ("asserter", t) => parse_reference(t).map(ConditionField::AsserterRef),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Condition.onset[x]:onsetDateTime", "Condition.onset[x].dateTime")]
    #[test_case("Condition.abatement[x]:abatementString", "Condition.abatement[x].string")]
    #[test_case("Condition.abatement[x]:Period.start", "Condition.abatement[x].Period.start")]
    #[test_case("Patient.deceased[x]:deceasedBoolean", "Patient.deceased[x].boolean")]
    #[test_case("Patient.name.HumanName.given", "Patient.name.HumanName.given")]
    fn test_normalize(input: &str, expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test_case("Patient.id", TargetField::Patient(PatientField::Id))]
    #[test_case("Patient.name.HumanName.given", TargetField::Patient(PatientField::Name(NameField::Given)))]
    #[test_case("Patient.name.family", TargetField::Patient(PatientField::Name(NameField::Family)))]
    #[test_case("Patient.deceased[x]:deceasedDateTime", TargetField::Patient(PatientField::DeceasedDateTime))]
    #[test_case("Patient.generalPractitioner", TargetField::Patient(PatientField::GeneralPractitioner))]
    #[test_case("Patient.generalPractitioner.Reference.display", TargetField::Patient(PatientField::GeneralPractitionerRef(ReferenceField::Display)))]
    #[test_case("Practitioner.address.Address.postalCode", TargetField::Practitioner(PractitionerField::Address(AddressField::PostalCode)))]
    #[test_case("Condition.subject", TargetField::Condition(ConditionField::Subject))]
    #[test_case("Condition.subject.Reference.identifier", TargetField::Condition(ConditionField::SubjectRef(ReferenceField::Identifier)))]
    #[test_case("Condition.onset[x]", TargetField::Condition(ConditionField::OnsetDateTime))]
    #[test_case("Condition.onset[x]:onsetDateTime", TargetField::Condition(ConditionField::OnsetDateTime))]
    #[test_case("Condition.abatement[x].Age.value", TargetField::Condition(ConditionField::AbatementAge(AgeField::Value)))]
    #[test_case("Condition.abatement[x].Period.end", TargetField::Condition(ConditionField::AbatementPeriod(PeriodField::End)))]
    #[test_case("Condition.meta.Meta.security", TargetField::Condition(ConditionField::Meta(MetaField::Security)))]
    fn test_parse_known(path: &str, expected: TargetField) {
        assert_eq!(parse(path), Some(expected));
    }

    #[test_case("Observation.code")]
    #[test_case("Patient")]
    #[test_case("Patient.maritalStatus")]
    #[test_case("Condition.abatement[x].Range.low")]
    #[test_case("Practitioner.generalPractitioner")]
    fn test_parse_unknown(path: &str) {
        assert_eq!(parse(path), None);
    }

    #[test]
    fn test_target_kind() {
        let field = parse("Condition.code").unwrap();
        assert_eq!(field.kind(), ResourceKind::Condition);
    }
}
