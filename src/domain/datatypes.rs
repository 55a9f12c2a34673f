//! FHIR R4 datatypes used by the generated resources
//!
//! Only the elements Tabula can populate from a mapping are modelled. Every
//! composite implements [`IsEmpty`] so assemblers can drop structures that
//! ended up without any populated element.

use serde::{Deserialize, Serialize};

/// Emptiness check for composite values
pub trait IsEmpty {
    /// Whether no element of the value is populated
    fn is_empty(&self) -> bool;
}

impl<T: IsEmpty> IsEmpty for Option<T> {
    fn is_empty(&self) -> bool {
        self.as_ref().map_or(true, IsEmpty::is_empty)
    }
}

impl<T: IsEmpty> IsEmpty for Vec<T> {
    fn is_empty(&self) -> bool {
        self.iter().all(IsEmpty::is_empty)
    }
}

impl IsEmpty for String {
    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

/// Keep a value only when it is not empty
pub fn non_empty<T: IsEmpty>(value: T) -> Option<T> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Coding: a code from a terminology system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Coding with a code and optional system
    pub fn new(system: Option<&str>, code: impl Into<String>) -> Self {
        Self {
            system: system.map(str::to_string),
            code: Some(code.into()),
            display: None,
        }
    }
}

impl IsEmpty for Coding {
    fn is_empty(&self) -> bool {
        self.code.is_none() && self.display.is_none()
    }
}

/// CodeableConcept: one or more codings plus text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Single-coding concept
    pub fn from_code(system: Option<&str>, code: impl Into<String>) -> Self {
        Self {
            coding: vec![Coding::new(system, code)],
            text: None,
        }
    }

    /// Code of the first coding, if any
    pub fn first_code(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.code.as_deref())
    }
}

impl IsEmpty for CodeableConcept {
    fn is_empty(&self) -> bool {
        IsEmpty::is_empty(&self.coding) && self.text.is_none()
    }
}

/// Identifier: business identifier with its namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl IsEmpty for Identifier {
    fn is_empty(&self) -> bool {
        self.system.is_none() && self.value.is_none()
    }
}

/// Period: start and end dates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl IsEmpty for Period {
    fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Quantity, also used as Age
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// `<` | `<=` | `>=` | `>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Age is a Quantity constrained to durations
pub type Age = Quantity;

impl IsEmpty for Quantity {
    fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.comparator.is_none()
            && self.unit.is_none()
            && self.system.is_none()
            && self.code.is_none()
    }
}

/// HumanName
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,
}

impl IsEmpty for HumanName {
    fn is_empty(&self) -> bool {
        self.use_.is_none()
            && self.text.is_none()
            && self.family.is_none()
            && IsEmpty::is_empty(&self.given)
            && IsEmpty::is_empty(&self.prefix)
            && IsEmpty::is_empty(&self.suffix)
    }
}

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl IsEmpty for Address {
    fn is_empty(&self) -> bool {
        self.use_.is_none()
            && self.type_.is_none()
            && self.text.is_none()
            && IsEmpty::is_empty(&self.line)
            && self.city.is_none()
            && self.district.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }
}

/// Contact point (phone, email, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    /// phone | fax | email | pager | url | sms | other
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// home | work | temp | old | mobile
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl IsEmpty for ContactPoint {
    fn is_empty(&self) -> bool {
        self.system.is_none() && self.value.is_none() && self.use_.is_none() && self.rank.is_none()
    }
}

/// Reference to another resource, literal or logical
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// Literal reference such as `Patient/123`
    pub fn literal(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }
}

impl IsEmpty for Reference {
    fn is_empty(&self) -> bool {
        self.reference.is_none() && IsEmpty::is_empty(&self.identifier) && self.display.is_none()
    }
}

/// Resource metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<Coding>,
}

impl IsEmpty for Meta {
    fn is_empty(&self) -> bool {
        self.version_id.is_none()
            && self.source.is_none()
            && IsEmpty::is_empty(&self.profile)
            && IsEmpty::is_empty(&self.security)
            && IsEmpty::is_empty(&self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_period_dropped() {
        assert!(non_empty(Period::default()).is_none());
        let period = Period {
            start: Some("2020-01-01".to_string()),
            end: None,
        };
        assert_eq!(non_empty(period.clone()), Some(period));
    }

    #[test]
    fn test_reference_with_empty_identifier_is_empty() {
        let reference = Reference {
            identifier: Some(Identifier::default()),
            ..Reference::default()
        };
        assert!(IsEmpty::is_empty(&reference));
        assert!(!IsEmpty::is_empty(&Reference::literal("Patient/1")));
    }

    #[test]
    fn test_human_name_serialization() {
        let name = HumanName {
            use_: Some("official".to_string()),
            family: Some("Doe".to_string()),
            given: vec!["Jane".to_string()],
            ..HumanName::default()
        };
        assert_eq!(
            serde_json::to_value(&name).unwrap(),
            json!({"use": "official", "family": "Doe", "given": ["Jane"]})
        );
    }

    #[test]
    fn test_address_field_names() {
        let address = Address {
            type_: Some("postal".to_string()),
            postal_code: Some("1011".to_string()),
            ..Address::default()
        };
        assert_eq!(
            serde_json::to_value(&address).unwrap(),
            json!({"type": "postal", "postalCode": "1011"})
        );
    }

    #[test]
    fn test_codeable_concept_first_code() {
        let concept = CodeableConcept::from_code(Some("http://snomed.info/sct"), "44054006");
        assert_eq!(concept.first_code(), Some("44054006"));
        assert_eq!(
            serde_json::to_value(&concept).unwrap(),
            json!({"coding": [{"system": "http://snomed.info/sct", "code": "44054006"}]})
        );
    }

    #[test]
    fn test_meta_emptiness() {
        assert!(IsEmpty::is_empty(&Meta::default()));
        let meta = Meta {
            profile: vec!["http://example.org/StructureDefinition/p".to_string()],
            ..Meta::default()
        };
        assert!(!IsEmpty::is_empty(&meta));
    }

    #[test]
    fn test_age_emptiness() {
        assert!(non_empty(Age::default()).is_none());
        let age = Age {
            value: Some(42.0),
            unit: Some("a".to_string()),
            ..Age::default()
        };
        assert!(non_empty(age).is_some());
    }
}
