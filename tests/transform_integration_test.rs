//! Integration tests for row transformation
//!
//! These tests drive the public pipeline (mapping document -> compiled rules
//! -> resources) against an in-memory FHIR server.

mod common;

use common::{condition_mapping, mapping, MockFhirServer};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tabula::config::ProfilesConfig;
use tabula::core::transform::{compile_rules, transform_row, transform_rows, LookupSession};
use tabula::domain::{Condition, Resource, ResourceKind, Row};
use tokio::sync::watch;

fn session(server: MockFhirServer) -> (Arc<MockFhirServer>, LookupSession) {
    let server = Arc::new(server);
    let session = LookupSession::new(server.clone(), Duration::from_secs(5));
    (server, session)
}

fn conditions(resources: &[Resource]) -> Vec<&Condition> {
    resources
        .iter()
        .filter_map(|r| match r {
            Resource::Condition(c) => Some(c),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_end_to_end_condition() {
    let (server, session) = session(MockFhirServer::new());
    let document = condition_mapping();
    let rules = compile_rules("Conditions", &document.sheets["Conditions"], &document.concept_maps);
    let row = Row::new()
        .with("PatientId", "P1")
        .with("Code", "44054006")
        .with("OnsetDate", "2020-01-05");

    let resources = transform_row(&row, &rules, &ProfilesConfig::default(), &session)
        .await
        .unwrap();

    let found = conditions(&resources);
    assert_eq!(resources.len(), 1);
    assert_eq!(found.len(), 1);

    let condition = found[0];
    assert_eq!(
        condition.subject.as_ref().unwrap().reference.as_deref(),
        Some("Patient/P1")
    );
    let code = condition.code.as_ref().unwrap();
    assert_eq!(code.first_code(), Some("44054006"));
    assert_eq!(code.coding[0].system.as_deref(), Some("http://snomed.info/sct"));
    assert_eq!(condition.onset_date_time.as_deref(), Some("2020-01-05"));
    assert_eq!(condition.id.as_str().len(), 64);

    // Literal subject references never hit the server
    assert_eq!(server.searches(), 0);
}

#[tokio::test]
async fn test_idempotent_ids_across_runs() {
    let document = condition_mapping();
    let rules = compile_rules("Conditions", &document.sheets["Conditions"], &document.concept_maps);
    let row = Row::new()
        .with("PatientId", "P1")
        .with("Code", "44054006")
        .with("OnsetDate", 43835.0);

    let (_, first_session) = session(MockFhirServer::new());
    let (_, second_session) = session(MockFhirServer::new());
    let first = transform_row(&row, &rules, &ProfilesConfig::default(), &first_session)
        .await
        .unwrap();
    let second = transform_row(&row, &rules, &ProfilesConfig::default(), &second_session)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_group_keys_expand_row() {
    let (_, session) = session(MockFhirServer::new());
    let document = mapping(json!({
        "sheets": {
            "Conditions": [
                {"sourceColumn": "PatientId", "targets": [
                    {"targetPath": "Condition.subject", "groupKey": "A"},
                    {"targetPath": "Condition.subject", "groupKey": "B"}
                ]},
                {"sourceColumn": "Code1", "targets": [{"targetPath": "Condition.code", "groupKey": "A"}]},
                {"sourceColumn": "Note1", "targets": [
                    {"targetPath": "Condition.abatement[x]:abatementString", "groupKey": "A"}
                ]},
                {"sourceColumn": "Code2", "targets": [{"targetPath": "Condition.code", "groupKey": "B"}]}
            ]
        }
    }));
    let rules = compile_rules("Conditions", &document.sheets["Conditions"], &HashMap::new());
    let row = Row::new()
        .with("PatientId", "P1")
        .with("Code1", "C1")
        .with("Note1", "resolved")
        .with("Code2", "C2");

    let resources = transform_row(&row, &rules, &ProfilesConfig::default(), &session)
        .await
        .unwrap();
    let found = conditions(&resources);

    assert_eq!(found.len(), 2);
    let a = found
        .iter()
        .find(|c| c.code.as_ref().and_then(|c| c.first_code()) == Some("C1"))
        .unwrap();
    let b = found
        .iter()
        .find(|c| c.code.as_ref().and_then(|c| c.first_code()) == Some("C2"))
        .unwrap();
    assert_eq!(a.abatement_string.as_deref(), Some("resolved"));
    assert!(b.abatement_string.is_none());
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_blank_cells_set_nothing() {
    let (_, session) = session(MockFhirServer::new());
    let document = condition_mapping();
    let rules = compile_rules("Conditions", &document.sheets["Conditions"], &document.concept_maps);
    let row: Row = serde_json::from_value(json!({
        "PatientId": "P1",
        "Code": "",
        "OnsetDate": null
    }))
    .unwrap();

    let resources = transform_row(&row, &rules, &ProfilesConfig::default(), &session)
        .await
        .unwrap();
    let condition = conditions(&resources)[0];

    assert!(condition.code.is_none());
    assert!(condition.onset_date_time.is_none());
    let value = serde_json::to_value(condition).unwrap();
    assert!(value.get("code").is_none());
}

#[tokio::test]
async fn test_whitespace_cells_set_nothing() {
    let (_, session) = session(MockFhirServer::new());
    let document = mapping(json!({
        "sheets": {
            "Patients": [
                {"sourceColumn": "Id", "targets": [{"targetPath": "Patient.id"}]},
                {"sourceColumn": "Family", "targets": [{"targetPath": "Patient.name.HumanName.family"}]},
                {"sourceColumn": "Mrn", "targets": [{"targetPath": "Patient.identifier.Identifier.value"}]}
            ]
        }
    }));
    let rules = compile_rules("Patients", &document.sheets["Patients"], &HashMap::new());
    let row = Row::new()
        .with("Id", "P1")
        .with("Family", "   ")
        .with("Mrn", " ");

    let resources = transform_row(&row, &rules, &ProfilesConfig::default(), &session)
        .await
        .unwrap();
    assert_eq!(resources.len(), 1);

    let value = serde_json::to_value(&resources[0]).unwrap();
    assert_eq!(value["resourceType"], "Patient");
    assert!(value.get("name").is_none());
    assert!(value.get("identifier").is_none());
}

#[tokio::test]
async fn test_whitespace_subject_is_not_a_reference() {
    let (_, session) = session(MockFhirServer::new());
    let document = condition_mapping();
    let rules = compile_rules("Conditions", &document.sheets["Conditions"], &document.concept_maps);
    let row = Row::new().with("PatientId", "  ").with("Code", "C1");

    let resources = transform_row(&row, &rules, &ProfilesConfig::default(), &session)
        .await
        .unwrap();
    let condition = conditions(&resources)[0];

    assert!(condition.subject.is_none());
    let value = serde_json::to_value(condition).unwrap();
    assert!(value.get("subject").is_none());
}

#[tokio::test]
async fn test_failed_lookup_does_not_affect_other_rows() {
    let (server, session) = session(
        MockFhirServer::new()
            .with_resource(ResourceKind::Practitioner, "PR-1", "pr1")
            .with_failing_search("PR-BROKEN"),
    );
    let document = mapping(json!({
        "sheets": {
            "Patients": [
                {"sourceColumn": "Id", "targets": [{"targetPath": "Patient.id"}]},
                {"sourceColumn": "GP", "targets": [{"targetPath": "Patient.generalPractitioner"}]}
            ]
        }
    }));
    let rules = compile_rules("Patients", &document.sheets["Patients"], &HashMap::new());
    let rows = vec![
        Row::new().with("Id", "P1").with("GP", "PR-1"),
        Row::new().with("Id", "P2").with("GP", "PR-BROKEN"),
        Row::new().with("Id", "P3").with("GP", "PR-1"),
    ];
    let (_tx, shutdown) = watch::channel(false);

    let output = transform_rows(
        "Patients",
        &rows,
        &rules,
        &ProfilesConfig::default(),
        &session,
        1,
        &shutdown,
    )
    .await
    .unwrap();

    assert_eq!(output.resources.len(), 3);
    assert_eq!(output.rows_failed, 0);

    let with_gp = output
        .resources
        .iter()
        .filter(|r| match r {
            Resource::Patient(p) => !p.general_practitioner.is_empty(),
            _ => false,
        })
        .count();
    assert_eq!(with_gp, 2);

    // PR-1 is memoized; failures are not
    assert_eq!(server.searches(), 2);
}

#[tokio::test]
async fn test_profiles_applied() {
    let (_, session) = session(MockFhirServer::new());
    let document = condition_mapping();
    let rules = compile_rules("Conditions", &document.sheets["Conditions"], &document.concept_maps);
    let profiles = ProfilesConfig {
        condition: Some("http://example.org/StructureDefinition/condition".to_string()),
        ..ProfilesConfig::default()
    };
    let row = Row::new().with("PatientId", "P1").with("Code", "C1");

    let resources = transform_row(&row, &rules, &profiles, &session).await.unwrap();
    let value = serde_json::to_value(&resources[0]).unwrap();

    assert_eq!(value["resourceType"], "Condition");
    assert_eq!(
        value["meta"]["profile"][0],
        "http://example.org/StructureDefinition/condition"
    );
}
