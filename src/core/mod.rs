//! Core business logic for Tabula.
//!
//! # Modules
//!
//! - [`transform`] - rows to FHIR resources
//! - [`import`] - sheet orchestration, batch upload and reporting
//!
//! # Import Workflow
//!
//! 1. **Compile**: parse the target paths of a sheet's mapping rules
//! 2. **Transform**: stage each row and assemble Patient, Practitioner and
//!    Condition resources, resolving references against the server
//! 3. **Submit**: upload the resources in batch bundles of `chunk_size`
//! 4. **Report**: one terminal status per sheet, rolled up into a summary
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabula::adapters::fhir::FhirClient;
//! use tabula::adapters::files::{load_mapping, load_rows};
//! use tabula::config::load_config;
//! use tabula::core::import::ImportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tabula.toml")?;
//! let mapping = load_mapping("mapping.json")?;
//! let workbook = load_rows("rows.json")?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let (events_tx, _events_rx) = tokio::sync::mpsc::unbounded_channel();
//!
//! let client = Arc::new(FhirClient::new(config.fhir.clone())?);
//! let coordinator = ImportCoordinator::new(&config, client, shutdown_rx);
//! let summary = coordinator.run(&mapping, &workbook, None, &events_tx).await;
//!
//! println!("Uploaded: {}", summary.resources_uploaded());
//! # Ok(())
//! # }
//! ```

pub mod import;
pub mod transform;
