//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for identifiers handled by Tabula.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource identifier newtype wrapper
///
/// Holds the logical id of a generated FHIR resource. Generated ids are
/// lowercase hex SHA-256 digests, but ids coming from a mapped `*.id` column
/// are accepted as long as they are non-empty and fit the FHIR id alphabet.
///
/// # Examples
///
/// ```
/// use tabula::domain::ids::ResourceId;
/// use std::str::FromStr;
///
/// let id = ResourceId::from_str("patient-001").unwrap();
/// assert_eq!(id.as_str(), "patient-001");
/// assert!(ResourceId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    /// Maximum length of a FHIR logical id
    pub const MAX_LEN: usize = 64;

    /// Creates a new ResourceId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(ResourceId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Resource ID cannot be empty".to_string());
        }
        if id.len() > Self::MAX_LEN {
            return Err(format!(
                "Resource ID exceeds {} characters: {}",
                Self::MAX_LEN,
                id
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(format!("Resource ID contains invalid characters: {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
