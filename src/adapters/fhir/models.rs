//! FHIR Bundle wire models
//!
//! Request and response shapes for the FHIR REST interactions Tabula uses:
//! searchset bundles coming back from `search`, and `batch` bundles going out
//! for uploads and deletes.

use crate::domain::{Resource, ResourceKind, Result, TabulaError};
use serde::{Deserialize, Serialize};

/// `Bundle.link`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

/// `Bundle.entry.request`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntryRequest {
    pub method: String,
    pub url: String,
}

/// `Bundle.entry.response`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntryResponse {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<serde_json::Value>,
}

impl BundleEntryResponse {
    /// Whether the status line starts with a 2xx code
    pub fn is_success(&self) -> bool {
        self.status.trim_start().starts_with('2')
    }
}

/// `Bundle.entry`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<BundleEntryResponse>,
}

impl BundleEntry {
    /// Logical id of the entry's resource
    pub fn resource_id(&self) -> Option<&str> {
        self.resource
            .as_ref()
            .and_then(|r| r.get("id"))
            .and_then(|id| id.as_str())
    }
}

/// FHIR Bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(rename = "type")]
    pub bundle_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    /// Empty searchset, as returned when nothing matches
    pub fn searchset(entries: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: "searchset".to_string(),
            total: Some(entries.len() as u64),
            link: Vec::new(),
            entry: entries,
        }
    }

    /// Batch bundle that upserts every resource at its computed id
    pub fn batch_upsert(resources: &[Resource]) -> Result<Self> {
        let entry = resources
            .iter()
            .map(|resource| {
                let body = serde_json::to_value(resource).map_err(|e| {
                    TabulaError::Serialization(format!(
                        "Failed to serialize {}: {e}",
                        resource.relative_url()
                    ))
                })?;
                Ok(BundleEntry {
                    full_url: None,
                    resource: Some(body),
                    request: Some(BundleEntryRequest {
                        method: "PUT".to_string(),
                        url: resource.relative_url(),
                    }),
                    response: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::batch(entry))
    }

    /// Batch bundle that deletes the given ids of one kind
    pub fn batch_delete<'a>(kind: ResourceKind, ids: impl IntoIterator<Item = &'a str>) -> Self {
        let entry = ids
            .into_iter()
            .map(|id| BundleEntry {
                request: Some(BundleEntryRequest {
                    method: "DELETE".to_string(),
                    url: format!("{kind}/{id}"),
                }),
                ..BundleEntry::default()
            })
            .collect();
        Self::batch(entry)
    }

    fn batch(entry: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: "batch".to_string(),
            total: None,
            link: Vec::new(),
            entry,
        }
    }

    /// Id of the first entry's resource
    pub fn first_resource_id(&self) -> Option<&str> {
        self.entry.iter().find_map(BundleEntry::resource_id)
    }

    /// URL of the `next` page link
    pub fn next_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|l| l.relation == "next")
            .map(|l| l.url.as_str())
    }

    /// Entries whose response status is not 2xx
    pub fn failed_entries(&self) -> impl Iterator<Item = (usize, &BundleEntryResponse)> {
        self.entry
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.response.as_ref().map(|r| (i, r)))
            .filter(|(_, r)| !r.is_success())
    }
}
