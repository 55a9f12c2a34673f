//! Reference resolution
//!
//! References are either literal (`Kind/value`) or resolved by searching the
//! FHIR server for a resource with a matching identifier. Lookups go through a
//! [`LookupSession`] owned by the import run, which memoizes results so a
//! practitioner referenced by thousands of rows is searched once.

use crate::adapters::fhir::LookupService;
use crate::core::transform::staged::StagedValue;
use crate::domain::datatypes::{non_empty, Reference};
use crate::domain::{FhirServerError, ResourceKind, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

type LookupKey = (ResourceKind, String);

/// Memoized identifier lookups for one import run
///
/// Each identifier gets one cell. Rows asking for the same identifier at the
/// same time wait on a single search instead of issuing their own.
pub struct LookupSession {
    service: Arc<dyn LookupService>,
    timeout: Duration,
    cache: Mutex<HashMap<LookupKey, Arc<OnceCell<Option<String>>>>>,
}

impl LookupSession {
    /// Create a session over a lookup service
    pub fn new(service: Arc<dyn LookupService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Underlying lookup service
    pub fn service(&self) -> &Arc<dyn LookupService> {
        &self.service
    }

    /// Number of memoized lookups (hits and misses)
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .map(|c| c.values().filter(|cell| cell.initialized()).count())
            .unwrap_or(0)
    }

    fn cell(&self, key: LookupKey) -> Arc<OnceCell<Option<String>>> {
        match self.cache.lock() {
            Ok(mut cache) => cache.entry(key).or_default().clone(),
            // A poisoned map only costs the memoization
            Err(_) => Arc::new(OnceCell::new()),
        }
    }

    /// Logical id of the first `kind` resource whose identifier matches `value`
    ///
    /// Empty results are memoized. Errors and timeouts are not, and resolve to
    /// `None`; the next caller for the same identifier searches again.
    pub async fn find_id_by_identifier(&self, kind: ResourceKind, value: &str) -> Option<String> {
        let cell = self.cell((kind, value.to_string()));
        match cell.get_or_try_init(|| self.search(kind, value)).await {
            Ok(id) => id.clone(),
            Err(e) => {
                tracing::warn!(resource_type = %kind, identifier = %value, error = %e, "Reference lookup failed");
                None
            }
        }
    }

    async fn search(&self, kind: ResourceKind, value: &str) -> Result<Option<String>> {
        let query = vec![("identifier".to_string(), value.to_string())];
        let bundle = tokio::time::timeout(self.timeout, self.service.search(kind, &query))
            .await
            .map_err(|_| {
                FhirServerError::Timeout(format!(
                    "lookup exceeded {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let id = bundle.first_resource_id().map(str::to_string);
        if id.is_none() {
            tracing::debug!(resource_type = %kind, identifier = %value, "No resource matches identifier");
        }
        Ok(id)
    }
}

/// How a bare reference column (`Condition.subject`) is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BareStrategy {
    /// `Kind/{value}`
    Literal,
    /// Search `Kind?identifier={value}`
    Lookup,
}

/// Staged values that feed one reference element
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceParts<'a> {
    pub bare: Option<&'a StagedValue>,
    pub reference: Option<&'a StagedValue>,
    pub identifier: Option<&'a StagedValue>,
    pub display: Option<&'a StagedValue>,
}

/// `Kind/value`, or the value as-is when it already is a relative reference
pub fn literal(kind: ResourceKind, value: &str) -> String {
    if value.contains('/') {
        value.to_string()
    } else {
        format!("{kind}/{value}")
    }
}

/// Build a reference element pointing at a `target` resource
///
/// An explicit `.Reference.reference` wins over an identifier lookup, which
/// wins over the bare column. A failed lookup leaves `reference` unset; the
/// element is dropped when nothing at all was populated.
pub async fn resolve(
    session: &LookupSession,
    target: ResourceKind,
    bare: BareStrategy,
    parts: ReferenceParts<'_>,
) -> Option<Reference> {
    let reference = if let Some(value) = parts.reference {
        Some(literal(target, &value.text()))
    } else if let Some(value) = parts.identifier {
        lookup(session, target, &value.text()).await
    } else if let Some(value) = parts.bare {
        match bare {
            BareStrategy::Literal => Some(literal(target, &value.text())),
            BareStrategy::Lookup => lookup(session, target, &value.text()).await,
        }
    } else {
        None
    };

    non_empty(Reference {
        reference,
        identifier: None,
        display: parts.display.map(StagedValue::text),
    })
}

async fn lookup(session: &LookupSession, target: ResourceKind, value: &str) -> Option<String> {
    session
        .find_id_by_identifier(target, value)
        .await
        .map(|id| format!("{target}/{id}"))
}
