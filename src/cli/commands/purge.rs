//! Purge command implementation
//!
//! Administrative reset: deletes every resource of one type on the configured
//! FHIR server.

use super::{confirm, exit_code};
use crate::adapters::fhir::{FhirClient, LookupService};
use crate::config::load_config;
use crate::domain::{FhirServerError, ResourceKind, TabulaError};
use clap::Args;

/// Arguments for the purge command
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Resource type to delete (Patient, Practitioner, Condition)
    #[arg(short, long)]
    pub resource_type: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl PurgeArgs {
    /// Execute the purge command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let kind: ResourceKind = match self.resource_type.parse() {
            Ok(kind) => kind,
            Err(e) => {
                eprintln!("{e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        if config.dry_run() {
            println!("🔍 DRY RUN MODE - {kind} resources would be deleted from {}", config.fhir.base_url);
            return Ok(exit_code::SUCCESS);
        }

        if !self.yes
            && !confirm(&format!(
                "Delete ALL {kind} resources from {}?",
                config.fhir.base_url
            ))?
        {
            println!("Purge cancelled.");
            return Ok(exit_code::SUCCESS);
        }

        let client = match FhirClient::new(config.fhir.clone()) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to initialize FHIR client: {e}");
                return Ok(exit_code::CONNECTION);
            }
        };

        tracing::info!(resource_type = %kind, server = %client.base_url(), "Purging resources");

        match client.delete_all(kind).await {
            Ok(()) => {
                println!("✅ Deleted all {kind} resources");
                Ok(exit_code::SUCCESS)
            }
            Err(e) => {
                tracing::error!(resource_type = %kind, error = %e, "Purge failed");
                eprintln!("Purge failed: {e}");
                Ok(purge_error_code(&e))
            }
        }
    }
}

fn purge_error_code(error: &TabulaError) -> i32 {
    match error {
        TabulaError::FhirServer(
            FhirServerError::ConnectionFailed(_)
            | FhirServerError::Timeout(_)
            | FhirServerError::AuthenticationFailed(_),
        ) => exit_code::CONNECTION,
        _ => exit_code::FATAL,
    }
}
