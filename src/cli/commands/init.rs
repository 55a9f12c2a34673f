//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::exit_code;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "tabula.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Tabula configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(exit_code::CONFIGURATION);
        }

        let config_content = if self.with_examples {
            CONFIG_WITH_EXAMPLES
        } else {
            MINIMAL_CONFIG
        };

        match fs::write(&self.output, config_content) {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your FHIR server settings", self.output);
                println!("  2. Put credentials in a .env file (TABULA_FHIR_TOKEN, ...)");
                println!("  3. Validate configuration: tabula validate-config");
                println!("  4. Run an import: tabula import --mapping mapping.json --data rows.json");
                println!();
                Ok(exit_code::SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(exit_code::FATAL)
            }
        }
    }
}

const MINIMAL_CONFIG: &str = r#"# Tabula Configuration File
environment = "development"

[application]
log_level = "info"
dry_run = false

[fhir]
base_url = "http://localhost:8080/fhir"
auth_type = "none"
tls_verify = true
timeout_seconds = 60

[import]
chunk_size = 5000
row_concurrency = 16
max_concurrent_uploads = 1

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#;

const CONFIG_WITH_EXAMPLES: &str = r#"# Tabula Configuration File
#
# Values of the form ${VAR_NAME} are read from the environment (or a .env
# file). Any setting can also be overridden with TABULA_<SECTION>_<KEY>,
# for example TABULA_IMPORT_CHUNK_SIZE=1000.

# development | staging | production
# TLS verification cannot be disabled in production.
environment = "development"

[application]
# trace, debug, info, warn, error
log_level = "info"

# Transform everything but upload nothing
dry_run = false

[fhir]
# Base URL of the FHIR R4 server
base_url = "http://localhost:8080/fhir"

# none | basic | bearer
auth_type = "none"
# username = "importer"
# password = "${TABULA_FHIR_PASSWORD}"
# token = "${TABULA_FHIR_TOKEN}"

tls_verify = true

# HTTP request timeout
timeout_seconds = 60

[fhir.retry]
# Attempts per chunk upload; 1 disables retries
max_attempts = 1
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[import]
# Resources per batch bundle (1-5000)
chunk_size = 5000

# Rows transformed concurrently per sheet
row_concurrency = 16

# Batch uploads in flight across all sheets
max_concurrent_uploads = 1

# Upper bound for one reference lookup
lookup_timeout_seconds = 30

[import.profiles]
# Written first in meta.profile of every generated resource
# patient = "http://example.org/StructureDefinition/my-patient"
# practitioner = "http://example.org/StructureDefinition/my-practitioner"
# condition = "http://example.org/StructureDefinition/my-condition"

[logging]
# JSON console output
json = false

# Rolling JSON log files
local_enabled = false
local_path = "./logs"

# daily | hourly | never
local_rotation = "daily"
"#;
