//! Configuration management for Tabula.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `TABULA_*` environment
//! overrides, defaults for every optional setting, and validation on load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tabula::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tabula.toml")?;
//!
//! println!("FHIR server: {}", config.fhir.base_url);
//! println!("Chunk size: {}", config.import.chunk_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level and dry run
//! - [`FhirConfig`] - FHIR server connection, authentication and retry
//! - [`ImportConfig`] - chunking, concurrency, timeouts and profiles
//! - [`LoggingConfig`] - local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "development"
//!
//! [application]
//! log_level = "info"
//!
//! [fhir]
//! base_url = "https://fhir.example.org/fhir"
//! auth_type = "bearer"
//! token = "${TABULA_FHIR_TOKEN}"
//!
//! [import]
//! chunk_size = 5000
//! row_concurrency = 16
//!
//! [import.profiles]
//! condition = "http://example.org/StructureDefinition/my-condition"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, Environment, FhirConfig, ImportConfig, LoggingConfig, ProfilesConfig,
    RetryConfig, TabulaConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
