// Tabula - Spreadsheet rows to FHIR R4 import tool
// Copyright (c) 2025 Tabula Contributors
// Licensed under the MIT License

//! # Tabula - Spreadsheet rows to FHIR R4
//!
//! Tabula turns tabular clinical data (rows from spreadsheet sheets) into FHIR
//! R4 Patient, Practitioner and Condition resources according to a declarative
//! mapping document, and uploads them to a FHIR server in batch bundles.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (row transformation, import orchestration)
//! - [`adapters`] - External integrations (FHIR server, JSON input files)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabula::adapters::fhir::FhirClient;
//! use tabula::adapters::files::{load_mapping, load_rows};
//! use tabula::config::load_config;
//! use tabula::core::import::ImportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("tabula.toml")?;
//!     let mapping = load_mapping("mapping.json")?;
//!     let workbook = load_rows("rows.json")?;
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let (events_tx, _events_rx) = tokio::sync::mpsc::unbounded_channel();
//!
//!     let client = Arc::new(FhirClient::new(config.fhir.clone())?);
//!     let coordinator = ImportCoordinator::new(&config, client, shutdown_rx);
//!     let summary = coordinator.run(&mapping, &workbook, None, &events_tx).await;
//!
//!     println!("Uploaded {} resources", summary.resources_uploaded());
//!     Ok(())
//! }
//! ```
//!
//! ## Idempotent Imports
//!
//! Resource ids are SHA-256 digests of identifying content, so importing the
//! same rows twice updates the same server resources instead of duplicating
//! them:
//!
//! ```rust
//! use tabula::core::transform::identity::person_id;
//! use tabula::domain::ResourceKind;
//!
//! let first = person_id(ResourceKind::Patient, Some("P1"), None).unwrap();
//! let second = person_id(ResourceKind::Patient, Some("P1"), None).unwrap();
//! assert_eq!(first, second);
//! ```
//!
//! ## Error Handling
//!
//! Tabula uses the [`domain::TabulaError`] type for all library errors:
//!
//! ```rust,no_run
//! use tabula::domain::TabulaError;
//!
//! fn example() -> Result<(), TabulaError> {
//!     let _config = tabula::config::load_config("tabula.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
