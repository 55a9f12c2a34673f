//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::TabulaConfig;
use super::secret_string;
use crate::domain::errors::TabulaError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`TabulaConfig`]
/// 4. Applies environment variable overrides (`TABULA_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`TabulaError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use tabula::config::loader::load_config;
///
/// let config = load_config("tabula.toml")?;
/// println!("{}", config.fhir.base_url);
/// # Ok::<(), tabula::domain::TabulaError>(())
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TabulaConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TabulaError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        TabulaError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parse configuration text (substitution, overrides, validation)
pub fn parse_config(contents: &str) -> Result<TabulaConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: TabulaConfig = toml::from_str(&contents)?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        TabulaError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| TabulaError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |caps: &regex::Captures| {
                let var_name = &caps[1];
                match std::env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => {
                        if !missing_vars.iter().any(|v| v == var_name) {
                            missing_vars.push(var_name.to_string());
                        }
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(TabulaError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        TabulaError::Configuration(format!("Invalid value '{value}' for environment variable {name}"))
    })
}

/// Applies environment variable overrides using the `TABULA_*` prefix
///
/// Variables follow the pattern `TABULA_<SECTION>_<KEY>`, for example
/// `TABULA_FHIR_BASE_URL` or `TABULA_IMPORT_CHUNK_SIZE`. Malformed numeric
/// or boolean values are configuration errors.
fn apply_env_overrides(config: &mut TabulaConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    // Application overrides
    if let Some(val) = var("TABULA_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = var("TABULA_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_override("TABULA_APPLICATION_DRY_RUN", &val)?;
    }
    if let Some(val) = var("TABULA_ENVIRONMENT") {
        config.environment = match val.to_lowercase().as_str() {
            "development" => super::schema::Environment::Development,
            "staging" => super::schema::Environment::Staging,
            "production" => super::schema::Environment::Production,
            other => {
                return Err(TabulaError::Configuration(format!(
                    "Invalid value '{other}' for environment variable TABULA_ENVIRONMENT"
                )))
            }
        };
    }

    // FHIR overrides
    if let Some(val) = var("TABULA_FHIR_BASE_URL") {
        config.fhir.base_url = val;
    }
    if let Some(val) = var("TABULA_FHIR_AUTH_TYPE") {
        config.fhir.auth_type = val;
    }
    if let Some(val) = var("TABULA_FHIR_USERNAME") {
        config.fhir.username = Some(val);
    }
    if let Some(val) = var("TABULA_FHIR_PASSWORD") {
        config.fhir.password = Some(secret_string(val));
    }
    if let Some(val) = var("TABULA_FHIR_TOKEN") {
        config.fhir.token = Some(secret_string(val));
    }
    if let Some(val) = var("TABULA_FHIR_TLS_VERIFY") {
        config.fhir.tls_verify = parse_override("TABULA_FHIR_TLS_VERIFY", &val)?;
    }
    if let Some(val) = var("TABULA_FHIR_TIMEOUT_SECONDS") {
        config.fhir.timeout_seconds = parse_override("TABULA_FHIR_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = var("TABULA_FHIR_RETRY_MAX_ATTEMPTS") {
        config.fhir.retry.max_attempts = parse_override("TABULA_FHIR_RETRY_MAX_ATTEMPTS", &val)?;
    }

    // Import overrides
    if let Some(val) = var("TABULA_IMPORT_CHUNK_SIZE") {
        config.import.chunk_size = parse_override("TABULA_IMPORT_CHUNK_SIZE", &val)?;
    }
    if let Some(val) = var("TABULA_IMPORT_ROW_CONCURRENCY") {
        config.import.row_concurrency = parse_override("TABULA_IMPORT_ROW_CONCURRENCY", &val)?;
    }
    if let Some(val) = var("TABULA_IMPORT_MAX_CONCURRENT_UPLOADS") {
        config.import.max_concurrent_uploads =
            parse_override("TABULA_IMPORT_MAX_CONCURRENT_UPLOADS", &val)?;
    }
    if let Some(val) = var("TABULA_IMPORT_LOOKUP_TIMEOUT_SECONDS") {
        config.import.lookup_timeout_seconds =
            parse_override("TABULA_IMPORT_LOOKUP_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = var("TABULA_IMPORT_DRY_RUN") {
        config.import.dry_run = parse_override("TABULA_IMPORT_DRY_RUN", &val)?;
    }

    // Logging overrides
    if let Some(val) = var("TABULA_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("TABULA_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = var("TABULA_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("TABULA_TEST_SUBST_VAR", "test_value");
        let input = "password = \"${TABULA_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"");
        std::env::remove_var("TABULA_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("TABULA_TEST_MISSING_VAR");
        let input = "password = \"${TABULA_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("TABULA_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("TABULA_TEST_COMMENTED_VAR");
        let input = "# token = \"${TABULA_TEST_COMMENTED_VAR}\"\nkey = 1";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-tabula.toml");
        assert!(matches!(result, Err(TabulaError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
environment = "staging"

[application]
log_level = "debug"

[fhir]
base_url = "https://fhir.example.com/fhir"
auth_type = "basic"
username = "user"
password = "pass"

[import]
chunk_size = 1000

[import.profiles]
condition = "http://example.org/StructureDefinition/condition"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.fhir.base_url, "https://fhir.example.com/fhir");
        assert_eq!(config.import.chunk_size, 1000);
        assert_eq!(config.import.row_concurrency, 16);
        assert_eq!(
            config.import.profiles.condition.as_deref(),
            Some("http://example.org/StructureDefinition/condition")
        );
    }

    #[test]
    fn test_parse_config_invalid_chunk_size() {
        let err = parse_config(
            r#"
[fhir]
base_url = "http://localhost:8080/fhir"

[import]
chunk_size = 6000
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("import.chunk_size"));
    }
}
