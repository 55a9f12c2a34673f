//! Deterministic resource identity
//!
//! Ids are the lowercase hex SHA-256 of the concatenated identifying fields, so
//! importing the same row twice addresses the same server resource.

use crate::domain::datatypes::Identifier;
use crate::domain::{ResourceId, ResourceKind, Result, TabulaError};
use sha2::{Digest, Sha256};

/// Hash identifying parts into a resource id
///
/// Absent parts contribute nothing. If every part is absent or empty the
/// resource has no identity and [`TabulaError::MissingIdentity`] is returned.
pub fn derive_id(kind: ResourceKind, parts: &[Option<&str>]) -> Result<ResourceId> {
    let material: String = parts.iter().flatten().copied().collect();
    if material.is_empty() {
        return Err(TabulaError::MissingIdentity { kind });
    }

    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    ResourceId::new(digest).map_err(TabulaError::Validation)
}

/// Id for Patient and Practitioner
///
/// The mapped `id` column when present, else `identifier.system + identifier.value`.
pub fn person_id(
    kind: ResourceKind,
    mapped_id: Option<&str>,
    identifier: Option<&Identifier>,
) -> Result<ResourceId> {
    match mapped_id {
        Some(id) => derive_id(kind, &[Some(id)]),
        None => derive_id(
            kind,
            &[
                identifier.and_then(|i| i.system.as_deref()),
                identifier.and_then(|i| i.value.as_deref()),
            ],
        ),
    }
}

/// Id for Condition
///
/// The mapped `id` column when present, else
/// `subject.reference + code + onsetDateTime + abatementDateTime`.
pub fn condition_id(
    mapped_id: Option<&str>,
    subject_reference: Option<&str>,
    code: Option<&str>,
    onset: Option<&str>,
    abatement: Option<&str>,
) -> Result<ResourceId> {
    match mapped_id {
        Some(id) => derive_id(ResourceKind::Condition, &[Some(id)]),
        None => derive_id(
            ResourceKind::Condition,
            &[subject_reference, code, onset, abatement],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let id = derive_id(ResourceKind::Patient, &[Some("abc")]).unwrap();
        assert_eq!(
            id.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic_and_sensitive() {
        let a = derive_id(ResourceKind::Condition, &[Some("Patient/P1"), Some("C1")]).unwrap();
        let b = derive_id(ResourceKind::Condition, &[Some("Patient/P1"), Some("C1")]).unwrap();
        let c = derive_id(ResourceKind::Condition, &[Some("Patient/P1"), Some("C2")]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_absent_parts_are_skipped() {
        let a = derive_id(ResourceKind::Practitioner, &[None, Some("x"), None]).unwrap();
        let b = derive_id(ResourceKind::Practitioner, &[Some("x")]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_person_id_prefers_mapped_id() {
        let identifier = Identifier {
            system: Some("urn:mrn".to_string()),
            value: Some("42".to_string()),
            ..Identifier::default()
        };
        let mapped = person_id(ResourceKind::Patient, Some("P1"), Some(&identifier)).unwrap();
        assert_eq!(mapped, derive_id(ResourceKind::Patient, &[Some("P1")]).unwrap());

        let fallback = person_id(ResourceKind::Patient, None, Some(&identifier)).unwrap();
        assert_eq!(
            fallback,
            derive_id(ResourceKind::Patient, &[Some("urn:mrn42")]).unwrap()
        );
        assert!(person_id(ResourceKind::Practitioner, None, None).is_err());
    }

    #[test]
    fn test_condition_id_parts() {
        let a = condition_id(None, Some("Patient/P1"), Some("C1"), Some("2020-01-05"), None).unwrap();
        let b = derive_id(
            ResourceKind::Condition,
            &[Some("Patient/P1C12020-01-05")],
        )
        .unwrap();
        assert_eq!(a, b);
        assert!(condition_id(None, None, None, None, None).is_err());
    }

    #[test]
    fn test_missing_identity() {
        let err = derive_id(ResourceKind::Condition, &[None, Some(""), None]).unwrap_err();
        assert!(matches!(
            err,
            TabulaError::MissingIdentity {
                kind: ResourceKind::Condition
            }
        ));
    }
}
