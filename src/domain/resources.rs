//! Generated FHIR resources
//!
//! [`Resource`] serializes with its `resourceType` discriminator. Optional
//! arrays are omitted when empty and every resource carries its computed id.

use super::datatypes::{
    Address, Age, CodeableConcept, ContactPoint, HumanName, Identifier, Meta, Period, Reference,
};
use super::ids::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource types Tabula generates or references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Patient,
    Practitioner,
    Condition,
    /// Only ever the target of `Condition.encounter`
    Encounter,
}

impl ResourceKind {
    /// Kinds Tabula generates
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Patient,
        ResourceKind::Practitioner,
        ResourceKind::Condition,
    ];

    /// FHIR resource type name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Patient => "Patient",
            ResourceKind::Practitioner => "Practitioner",
            ResourceKind::Condition => "Condition",
            ResourceKind::Encounter => "Encounter",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(ResourceKind::Patient),
            "Practitioner" => Ok(ResourceKind::Practitioner),
            "Condition" => Ok(ResourceKind::Condition),
            other => Err(format!(
                "Unsupported resource type '{other}'. Expected one of: Patient, Practitioner, Condition"
            )),
        }
    }
}

/// FHIR Patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: ResourceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deceased_boolean: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deceased_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub general_practitioner: Vec<Reference>,
}

/// FHIR Practitioner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    pub id: ResourceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

/// FHIR Condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: ResourceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_site: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abatement_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abatement_age: Option<Age>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abatement_period: Option<Period>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abatement_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorder: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asserter: Option<Reference>,
}

/// Any generated resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Practitioner(Practitioner),
    Condition(Condition),
}

impl Resource {
    /// Computed logical id
    pub fn id(&self) -> &ResourceId {
        match self {
            Resource::Patient(r) => &r.id,
            Resource::Practitioner(r) => &r.id,
            Resource::Condition(r) => &r.id,
        }
    }

    /// Resource type
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Patient(_) => ResourceKind::Patient,
            Resource::Practitioner(_) => ResourceKind::Practitioner,
            Resource::Condition(_) => ResourceKind::Condition,
        }
    }

    /// Relative URL of the resource on a FHIR server (`Kind/id`)
    pub fn relative_url(&self) -> String {
        format!("{}/{}", self.kind(), self.id())
    }
}

impl From<Patient> for Resource {
    fn from(r: Patient) -> Self {
        Resource::Patient(r)
    }
}

impl From<Practitioner> for Resource {
    fn from(r: Practitioner) -> Self {
        Resource::Practitioner(r)
    }
}

impl From<Condition> for Resource {
    fn from(r: Condition) -> Self {
        Resource::Condition(r)
    }
}
