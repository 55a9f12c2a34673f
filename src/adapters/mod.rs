//! External system integrations for Tabula.
//!
//! - [`fhir`] - FHIR server integration (search, batch upload, purge)
//! - [`files`] - JSON mapping documents and row data
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies. The import core only sees the
//! [`fhir::LookupService`] trait, so tests can substitute an in-memory server:
//!
//! ```rust,no_run
//! use tabula::adapters::fhir::{FhirClient, LookupService};
//! use tabula::config::FhirConfig;
//! use tabula::domain::ResourceKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FhirClient::new(FhirConfig {
//!     base_url: "https://fhir.example.org/fhir".to_string(),
//!     ..FhirConfig::default()
//! })?;
//!
//! let query = vec![("identifier".to_string(), "PR-7".to_string())];
//! let bundle = client.search(ResourceKind::Practitioner, &query).await?;
//! println!("matches: {}", bundle.entry.len());
//! # Ok(())
//! # }
//! ```

pub mod fhir;
pub mod files;
