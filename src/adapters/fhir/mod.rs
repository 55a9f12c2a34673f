//! FHIR server adapter
//!
//! [`LookupService`] is the seam the import core depends on; [`FhirClient`]
//! implements it over the FHIR REST API.

pub mod client;
pub mod models;
pub mod traits;

pub use client::FhirClient;
pub use models::{Bundle, BundleEntry};
pub use traits::LookupService;
