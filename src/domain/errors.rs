//! Domain error types
//!
//! This module defines the error hierarchy for Tabula.
//! All errors are domain-specific and don't expose third-party types.

use super::resources::ResourceKind;
use thiserror::Error;

/// Main Tabula error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum TabulaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// FHIR server errors
    #[error("FHIR server error: {0}")]
    FhirServer(#[from] FhirServerError),

    /// Invalid mapping document or mapping rule
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Row or sheet transformation errors
    #[error("Transform error: {0}")]
    Transform(String),

    /// An assembled resource ended up without an identity
    #[error("Id field is empty for {kind} resource")]
    MissingIdentity {
        /// Kind of the resource that was dropped
        kind: ResourceKind,
    },

    /// A single cell value could not be coerced to the requested type
    #[error("Coercion error: {0}")]
    Coercion(String),

    /// Work was abandoned because a shutdown signal was received
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl TabulaError {
    /// Whether this error only affects a single resource instance
    pub fn is_resource_local(&self) -> bool {
        matches!(self, TabulaError::MissingIdentity { .. })
    }
}

/// FHIR server errors
///
/// Errors that occur when talking to the FHIR server.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum FhirServerError {
    /// Failed to connect to the FHIR server
    #[error("Failed to connect to FHIR server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Search interaction failed
    #[error("Search failed: {0}")]
    SearchFailed(String),

    /// Batch bundle was rejected as a whole
    #[error("Batch rejected: {0}")]
    BatchRejected(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl FhirServerError {
    /// Map a non-success HTTP status to the matching error variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => FhirServerError::AuthenticationFailed(message),
            400..=499 => FhirServerError::ClientError { status, message },
            _ => FhirServerError::ServerError { status, message },
        }
    }

    /// Whether retrying the request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FhirServerError::ConnectionFailed(_) | FhirServerError::Timeout(_) => true,
            FhirServerError::ServerError { .. } => true,
            FhirServerError::ClientError { status, .. } => *status == 429,
            _ => false,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        TabulaError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        TabulaError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TabulaError {
    fn from(err: toml::de::Error) -> Self {
        TabulaError::Configuration(format!("TOML parse error: {err}"))
    }
}
