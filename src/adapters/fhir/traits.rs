//! Lookup service trait
//!
//! The import core talks to a FHIR server only through [`LookupService`]. The
//! production implementation is [`FhirClient`](super::FhirClient); tests plug in
//! in-memory implementations.

use super::models::Bundle;
use crate::domain::{Resource, ResourceKind, Result};
use async_trait::async_trait;

/// Search and write access to a FHIR server
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Search resources of one kind by search parameters
    ///
    /// An empty searchset is a successful result.
    async fn search(&self, kind: ResourceKind, query: &[(String, String)]) -> Result<Bundle>;

    /// Upload one chunk of resources as a single batch
    async fn post_batch(&self, resources: &[Resource]) -> Result<()>;

    /// Delete every resource of one kind
    async fn delete_all(&self, kind: ResourceKind) -> Result<()>;
}
