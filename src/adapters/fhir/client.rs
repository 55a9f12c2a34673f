//! FHIR REST client
//!
//! reqwest-based [`LookupService`] implementation. Uploads are `batch` bundles
//! with `PUT Kind/id` entries so that re-importing the same rows updates the
//! same server resources.

use super::models::Bundle;
use super::traits::LookupService;
use crate::config::FhirConfig;
use crate::domain::{FhirServerError, Resource, ResourceKind, Result, TabulaError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use secrecy::ExposeSecret;
use std::time::Duration;
use url::Url;

/// FHIR JSON media type
pub const FHIR_JSON: &str = "application/fhir+json";

/// Page size used when listing ids for deletion
const DELETE_PAGE_SIZE: usize = 500;

/// Upper bound on search-then-delete rounds in [`LookupService::delete_all`]
const MAX_DELETE_ROUNDS: usize = 200;

/// HTTP client for a FHIR R4 server
#[derive(Debug, Clone)]
pub struct FhirClient {
    base_url: Url,
    client: Client,
    config: FhirConfig,
}

impl FhirClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(config: FhirConfig) -> Result<Self> {
        // Trailing slash so that `join("Patient")` appends instead of replacing
        let normalized = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| {
            TabulaError::Configuration(format!("Invalid fhir.base_url '{}': {e}", config.base_url))
        })?;

        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for the FHIR server");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| FhirServerError::ConnectionFailed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            client,
            config,
        })
    }

    /// Base URL of the server
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            TabulaError::Configuration(format!("Invalid FHIR endpoint '{path}': {e}"))
        })
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        match self.config.auth_type.as_str() {
            "bearer" => self
                .config
                .token
                .as_ref()
                .map(|t| format!("Bearer {}", t.expose_secret().as_ref())),
            "basic" => match (&self.config.username, &self.config.password) {
                (Some(username), Some(password)) => {
                    let credentials = format!("{username}:{}", password.expose_secret().as_ref());
                    let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                    Some(format!("Basic {encoded}"))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, FHIR_JSON);
        match self.auth_header_value() {
            Some(auth) => request.header(AUTHORIZATION, auth),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.with_headers(request).send().await.map_err(|e| {
            if e.is_timeout() {
                FhirServerError::Timeout(e.to_string()).into()
            } else {
                FhirServerError::ConnectionFailed(e.to_string()).into()
            }
        })
    }

    /// Post a bundle and parse the response bundle
    async fn post_bundle(&self, bundle: &Bundle) -> Result<Option<Bundle>> {
        let body = serde_json::to_vec(bundle)?;
        let request = self
            .client
            .post(self.base_url.clone())
            .header(CONTENT_TYPE, FHIR_JSON)
            .body(body);

        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 | 429 => FhirServerError::from_status(status.as_u16(), body),
                400..=499 => FhirServerError::BatchRejected(format!("status {status}: {body}")),
                code => FhirServerError::from_status(code, body),
            }
            .into());
        }

        match response.json::<Bundle>().await {
            Ok(reply) => Ok(Some(reply)),
            Err(e) => {
                tracing::warn!(error = %e, "Batch response is not a Bundle, entry outcomes unknown");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl LookupService for FhirClient {
    async fn search(&self, kind: ResourceKind, query: &[(String, String)]) -> Result<Bundle> {
        let url = self.endpoint(kind.as_str())?;
        tracing::debug!(resource_type = %kind, params = ?query, "Searching FHIR server");

        let response = self.send(self.client.get(url).query(query)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 | 429 => FhirServerError::from_status(status.as_u16(), body),
                400..=499 => FhirServerError::SearchFailed(format!(
                    "{kind} search failed with status {status}: {body}"
                )),
                code => FhirServerError::from_status(code, body),
            }
            .into());
        }

        response
            .json::<Bundle>()
            .await
            .map_err(|e| FhirServerError::InvalidResponse(e.to_string()).into())
    }

    async fn post_batch(&self, resources: &[Resource]) -> Result<()> {
        if resources.is_empty() {
            return Ok(());
        }

        let bundle = Bundle::batch_upsert(resources)?;
        let Some(reply) = self.post_bundle(&bundle).await? else {
            return Ok(());
        };

        let mut failed = 0usize;
        for (index, response) in reply.failed_entries() {
            failed += 1;
            tracing::debug!(
                entry = index,
                resource = %resources.get(index).map(Resource::relative_url).unwrap_or_default(),
                status = %response.status,
                "Batch entry rejected"
            );
        }
        if failed > 0 {
            tracing::warn!(
                failed = failed,
                total = resources.len(),
                "FHIR server rejected some batch entries"
            );
        }

        Ok(())
    }

    async fn delete_all(&self, kind: ResourceKind) -> Result<()> {
        let query = vec![
            ("_elements".to_string(), "id".to_string()),
            ("_count".to_string(), DELETE_PAGE_SIZE.to_string()),
        ];
        let mut previous: Vec<String> = Vec::new();
        let mut deleted = 0usize;

        for round in 1..=MAX_DELETE_ROUNDS {
            let page = self.search(kind, &query).await?;
            let ids: Vec<String> = page
                .entry
                .iter()
                .filter_map(|e| e.resource_id().map(str::to_string))
                .collect();

            if ids.is_empty() {
                tracing::info!(resource_type = %kind, deleted = deleted, "Deleted all resources");
                return Ok(());
            }
            if ids == previous {
                return Err(FhirServerError::BatchRejected(format!(
                    "{kind} resources were not deleted in round {round}"
                ))
                .into());
            }

            self.post_bundle(&Bundle::batch_delete(kind, ids.iter().map(String::as_str)))
                .await?;
            deleted += ids.len();
            tracing::debug!(resource_type = %kind, round = round, count = ids.len(), "Delete round complete");
            previous = ids;
        }

        Err(FhirServerError::BatchRejected(format!(
            "{kind} resources remain after {MAX_DELETE_ROUNDS} delete rounds"
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_base_url_normalization() {
        let client = FhirClient::new(FhirConfig {
            base_url: "http://localhost:8080/fhir/".to_string(),
            ..FhirConfig::default()
        })
        .unwrap();

        assert_eq!(client.base_url(), "http://localhost:8080/fhir");
        assert_eq!(
            client.endpoint("Patient").unwrap().as_str(),
            "http://localhost:8080/fhir/Patient"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = FhirClient::new(FhirConfig {
            base_url: "not a url".to_string(),
            ..FhirConfig::default()
        });
        assert!(matches!(result, Err(TabulaError::Configuration(_))));
    }

    #[test]
    fn test_auth_header_variants() {
        let none = FhirClient::new(FhirConfig::default()).unwrap();
        assert!(none.auth_header_value().is_none());

        let basic = FhirClient::new(FhirConfig {
            auth_type: "basic".to_string(),
            username: Some("user".to_string()),
            password: Some(secret_string("pass".to_string())),
            ..FhirConfig::default()
        })
        .unwrap();
        assert_eq!(basic.auth_header_value().as_deref(), Some("Basic dXNlcjpwYXNz"));

        let bearer = FhirClient::new(FhirConfig {
            auth_type: "bearer".to_string(),
            token: Some(secret_string("tok".to_string())),
            ..FhirConfig::default()
        })
        .unwrap();
        assert_eq!(bearer.auth_header_value().as_deref(), Some("Bearer tok"));
    }
}
