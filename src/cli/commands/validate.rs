//! Validate config command implementation

use super::exit_code;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so any error here is reported as a
    /// configuration error.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.dry_run());
        println!("  FHIR Server: {}", config.fhir.base_url);
        println!("  Auth Type: {}", config.fhir.auth_type);
        println!("  TLS Verify: {}", config.fhir.tls_verify);
        println!("  Retry Attempts: {}", config.fhir.retry.max_attempts);
        println!("  Chunk Size: {}", config.import.chunk_size);
        println!("  Row Concurrency: {}", config.import.row_concurrency);
        println!(
            "  Concurrent Uploads: {}",
            config.import.max_concurrent_uploads
        );
        println!(
            "  Lookup Timeout: {}s",
            config.import.lookup_timeout_seconds
        );
        for (kind, profile) in [
            ("Patient", &config.import.profiles.patient),
            ("Practitioner", &config.import.profiles.practitioner),
            ("Condition", &config.import.profiles.condition),
        ] {
            if let Some(profile) = profile {
                println!("  {kind} Profile: {profile}");
            }
        }
        println!();

        Ok(exit_code::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("does-not-exist.toml")
            .await
            .unwrap();
        assert_eq!(code, exit_code::CONFIGURATION);
    }

    #[tokio::test]
    async fn test_validate_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[fhir]\nbase_url = \"https://fhir.example.org/fhir\"").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let code = ValidateArgs {}.execute(&path).await.unwrap();
        assert_eq!(code, exit_code::SUCCESS);
    }
}
