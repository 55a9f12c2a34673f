//! Integration tests for sheet import and batch submission

mod common;

use common::{condition_mapping, MockFhirServer};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tabula::config::{ImportConfig, RetryConfig};
use tabula::core::import::{BatchSubmitter, ImportCoordinator, SheetEvent, SheetStatus};
use tabula::domain::{Resource, Row, Workbook};
use tokio::sync::{mpsc, watch, Semaphore};

fn patients(n: usize) -> Vec<Resource> {
    (0..n)
        .map(|i| serde_json::from_value(json!({"resourceType": "Patient", "id": format!("p{i}")})).unwrap())
        .collect()
}

fn condition_rows(n: usize) -> Workbook {
    let rows = (0..n)
        .map(|i| {
            Row::new()
                .with("PatientId", format!("P{i}"))
                .with("Code", "44054006")
                .with("OnsetDate", "2020-01-05")
        })
        .collect();
    Workbook::from([("Conditions".to_string(), rows)])
}

fn coordinator(
    server: Arc<MockFhirServer>,
    chunk_size: usize,
    dry_run: bool,
    shutdown: watch::Receiver<bool>,
) -> ImportCoordinator {
    let import = ImportConfig {
        chunk_size,
        ..ImportConfig::default()
    };
    ImportCoordinator::from_parts(import, RetryConfig::default(), dry_run, server, shutdown)
}

async fn drain(mut events: mpsc::UnboundedReceiver<SheetEvent>) -> Vec<SheetEvent> {
    let mut collected = Vec::new();
    while let Some(event) = events.recv().await {
        collected.push(event);
    }
    collected
}

#[tokio::test]
async fn test_chunks_are_bounded_and_ordered() {
    let server = Arc::new(MockFhirServer::new());
    let submitter = BatchSubmitter::new(server.clone(), Arc::new(Semaphore::new(1)), 5000);
    let (_tx, shutdown) = watch::channel(false);

    let report = submitter.submit("Patients", &patients(10_001), &shutdown).await;

    assert_eq!(server.batch_sizes(), vec![5000, 5000, 1]);
    assert_eq!(report.chunks_submitted, 3);
    assert_eq!(report.resources_uploaded, 10_001);
    assert!(report.is_complete());

    // Order within and across chunks is preserved
    let uploaded = server.uploaded();
    assert_eq!(uploaded[0].id().as_str(), "p0");
    assert_eq!(uploaded[10_000].id().as_str(), "p10000");
}

#[tokio::test]
async fn test_last_chunk_takes_the_remainder() {
    let server = Arc::new(MockFhirServer::new());
    let submitter = BatchSubmitter::new(server.clone(), Arc::new(Semaphore::new(1)), 5000);
    let (_tx, shutdown) = watch::channel(false);

    let report = submitter.submit("Patients", &patients(12_001), &shutdown).await;

    assert_eq!(server.batch_sizes(), vec![5000, 5000, 2001]);
    assert_eq!(report.resources_uploaded, 12_001);
}

#[tokio::test]
async fn test_chunks_upload_one_at_a_time() {
    let server = Arc::new(MockFhirServer::new().with_upload_delay(Duration::from_millis(20)));
    // Spare upload slots: ordering must come from the submitter, not the semaphore
    let submitter = BatchSubmitter::new(server.clone(), Arc::new(Semaphore::new(4)), 2);
    let (_tx, shutdown) = watch::channel(false);

    let report = submitter.submit("Patients", &patients(7), &shutdown).await;

    assert_eq!(server.batch_sizes(), vec![2, 2, 2, 1]);
    assert_eq!(report.chunks_submitted, 4);
    assert_eq!(server.max_in_flight(), 1);
}

#[tokio::test]
async fn test_upload_slot_is_shared_across_sheets() {
    let server = Arc::new(MockFhirServer::new().with_upload_delay(Duration::from_millis(20)));
    let (_tx, shutdown) = watch::channel(false);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();

    let mut document = condition_mapping();
    let rules = document.sheets["Conditions"].clone();
    document.sheets.insert("MoreConditions".to_string(), rules);
    let mut workbook = condition_rows(4);
    let more = workbook["Conditions"].clone();
    workbook.insert("MoreConditions".to_string(), more);

    let summary = coordinator(server.clone(), 1, false, shutdown)
        .run(&document, &workbook, None, &events_tx)
        .await;

    assert_eq!(summary.resources_uploaded(), 8);
    assert_eq!(server.batch_sizes().len(), 8);
    assert_eq!(server.max_in_flight(), 1);
}

#[tokio::test]
async fn test_import_sheet_done() {
    let server = Arc::new(MockFhirServer::new());
    let (_tx, shutdown) = watch::channel(false);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let summary = coordinator(server.clone(), 2, false, shutdown)
        .run(&condition_mapping(), &condition_rows(5), None, &events_tx)
        .await;
    drop(events_tx);

    assert_eq!(
        drain(events_rx).await,
        vec![
            SheetEvent::info("Conditions", 5),
            SheetEvent::status("Conditions", SheetStatus::Done),
        ]
    );
    assert_eq!(server.batch_sizes(), vec![2, 2, 1]);
    assert_eq!(summary.resources_generated(), 5);
    assert_eq!(summary.resources_uploaded(), 5);
    assert!(summary.is_successful());
}

#[tokio::test]
async fn test_empty_sheet_warns_without_submitting() {
    let server = Arc::new(MockFhirServer::new());
    let (_tx, shutdown) = watch::channel(false);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let summary = coordinator(server.clone(), 5000, false, shutdown)
        .run(&condition_mapping(), &condition_rows(0), None, &events_tx)
        .await;
    drop(events_tx);

    assert_eq!(
        drain(events_rx).await,
        vec![
            SheetEvent::info("Conditions", 0),
            SheetEvent::status("Conditions", SheetStatus::warning("Empty sheet")),
        ]
    );
    assert!(server.batch_sizes().is_empty());
    assert!(summary.is_successful());
}

#[tokio::test]
async fn test_dry_run_uploads_nothing() {
    let server = Arc::new(MockFhirServer::new());
    let (_tx, shutdown) = watch::channel(false);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();

    let summary = coordinator(server.clone(), 2, true, shutdown)
        .run(&condition_mapping(), &condition_rows(3), None, &events_tx)
        .await;

    assert!(server.batch_sizes().is_empty());
    assert_eq!(summary.sheets[0].submission.chunks_submitted, 2);
    assert_eq!(summary.sheets[0].status, SheetStatus::Done);
}

#[tokio::test]
async fn test_shutdown_before_transform() {
    let server = Arc::new(MockFhirServer::new());
    let (tx, shutdown) = watch::channel(false);
    tx.send(true).unwrap();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let summary = coordinator(server.clone(), 2, false, shutdown)
        .run(&condition_mapping(), &condition_rows(3), None, &events_tx)
        .await;
    drop(events_tx);

    let events = drain(events_rx).await;
    assert_eq!(
        events.last(),
        Some(&SheetEvent::status(
            "Conditions",
            SheetStatus::error("Transform cancelled for sheet: Conditions")
        ))
    );
    assert!(server.batch_sizes().is_empty());
    assert!(summary.was_cancelled());
}

#[tokio::test]
async fn test_shutdown_during_upload_skips_remaining_chunks() {
    let (tx, shutdown) = watch::channel(false);
    let server = Arc::new(MockFhirServer::new().with_shutdown_after(1, tx));
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let summary = coordinator(server.clone(), 1, false, shutdown)
        .run(&condition_mapping(), &condition_rows(3), None, &events_tx)
        .await;
    drop(events_tx);

    assert_eq!(server.batch_sizes(), vec![1]);
    let sheet = &summary.sheets[0];
    assert_eq!(sheet.submission.chunks_skipped, 2);
    assert_eq!(
        sheet.status,
        SheetStatus::error("Upload cancelled for sheet: Conditions")
    );
    assert!(summary.was_cancelled());
    assert_eq!(drain(events_rx).await.len(), 2);
}
