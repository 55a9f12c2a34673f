//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tabula::adapters::fhir::{Bundle, BundleEntry, LookupService};
use tabula::domain::{FhirServerError, MappingDocument, Resource, ResourceKind, Result};
use tokio::sync::watch;

/// In-memory FHIR server
///
/// Resolves identifiers from a fixed table, fails searches for selected
/// identifiers, and records every uploaded batch along with the highest number
/// of uploads seen in flight at once.
#[derive(Default)]
pub struct MockFhirServer {
    ids: HashMap<(ResourceKind, String), String>,
    failing: HashSet<String>,
    batches: Mutex<Vec<Vec<Resource>>>,
    searches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    upload_delay: Option<Duration>,
    search_delay: Option<Duration>,
    shutdown_after: Option<(usize, watch::Sender<bool>)>,
}

impl MockFhirServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `identifier` of `kind` to `id`
    pub fn with_resource(mut self, kind: ResourceKind, identifier: &str, id: &str) -> Self {
        self.ids.insert((kind, identifier.to_string()), id.to_string());
        self
    }

    /// Fail every search for `identifier`
    pub fn with_failing_search(mut self, identifier: &str) -> Self {
        self.failing.insert(identifier.to_string());
        self
    }

    /// Raise the shutdown signal once `batches` uploads have been accepted
    pub fn with_shutdown_after(mut self, batches: usize, signal: watch::Sender<bool>) -> Self {
        self.shutdown_after = Some((batches, signal));
        self
    }

    /// Hold every upload open for `delay` before accepting it
    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = Some(delay);
        self
    }

    /// Hold every search open for `delay` before answering
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    /// Highest number of `post_batch` calls observed running concurrently
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn uploaded(&self) -> Vec<Resource> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupService for MockFhirServer {
    async fn search(&self, kind: ResourceKind, query: &[(String, String)]) -> Result<Bundle> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        let identifier = query
            .iter()
            .find(|(k, _)| k == "identifier")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();

        if self.failing.contains(&identifier) {
            return Err(FhirServerError::SearchFailed(format!("search for {identifier} failed")).into());
        }

        let entries = self
            .ids
            .get(&(kind, identifier))
            .map(|id| {
                vec![BundleEntry {
                    resource: Some(json!({"resourceType": kind.as_str(), "id": id})),
                    ..BundleEntry::default()
                }]
            })
            .unwrap_or_default();
        Ok(Bundle::searchset(entries))
    }

    async fn post_batch(&self, resources: &[Resource]) -> Result<()> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.upload_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let accepted = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(resources.to_vec());
            batches.len()
        };
        if let Some((after, signal)) = &self.shutdown_after {
            if accepted >= *after {
                let _ = signal.send(true);
            }
        }
        Ok(())
    }

    async fn delete_all(&self, _kind: ResourceKind) -> Result<()> {
        Ok(())
    }
}

/// Parse a mapping document from JSON
pub fn mapping(value: serde_json::Value) -> MappingDocument {
    serde_json::from_value(value).expect("valid mapping document")
}

/// Mapping for the `Conditions` sheet used across tests
pub fn condition_mapping() -> MappingDocument {
    mapping(json!({
        "sheets": {
            "Conditions": [
                {"sourceColumn": "PatientId", "targets": [{"targetPath": "Condition.subject"}]},
                {"sourceColumn": "Code", "targets": [{
                    "targetPath": "Condition.code",
                    "fixedUri": "http://snomed.info/sct"
                }]},
                {"sourceColumn": "OnsetDate", "valueType": "date", "targets": [
                    {"targetPath": "Condition.onset[x]:onsetDateTime"}
                ]}
            ]
        }
    }))
}
