use crate::auth::credential::Credential;
use crate::auth::credential_source::{ClientCredentials, CredentialSource, ManagedIdentity};
use crate::auth::oidc_token::{error_description, parse_token_response};
use crate::error::FetchError;
use anyhow::Context;
use chrono::Utc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches one credential per call. Implementations keep no token state between calls.
pub trait CredentialFetcher: Send + Sync {
    fn fetch(&self, source: &CredentialSource) -> Result<Credential, FetchError>;
}

/// Single-attempt HTTP fetcher for the metadata service and OIDC token endpoints.
pub struct HttpCredentialFetcher {
    client: reqwest::Client,
    metadata_endpoint: String,
    runtime: Handle,
}

impl HttpCredentialFetcher {
    /// `runtime` drives the requests made through [`CredentialFetcher::fetch`], which must
    /// therefore be called from outside of that runtime's async context.
    pub fn new(metadata_endpoint: impl Into<String>, runtime: Handle) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("While building http client")?;

        Ok(Self {
            client,
            metadata_endpoint: metadata_endpoint.into(),
            runtime,
        })
    }

    pub async fn fetch_async(&self, source: &CredentialSource) -> Result<Credential, FetchError> {
        let credential = match source {
            CredentialSource::ManagedIdentity(identity) => {
                self.fetch_from_metadata_service(identity).await?
            }
            CredentialSource::ClientCredentials(credentials) => {
                self.fetch_with_client_credentials(credentials).await?
            }
        };

        info!(
            "Extracted token (length: {}): {}...",
            credential.access_token.len(),
            credential.token_prefix()
        );

        Ok(credential)
    }

    async fn fetch_from_metadata_service(
        &self,
        identity: &ManagedIdentity,
    ) -> Result<Credential, FetchError> {
        let mut query = vec![
            ("api-version", IMDS_API_VERSION),
            ("resource", identity.resource_uri.as_str()),
        ];
        if let Some(client_id) = identity.client_id.as_deref() {
            query.push(("client_id", client_id));
        }

        debug!(
            "Attempting to get token from {} for resource {}",
            self.metadata_endpoint, identity.resource_uri
        );

        let request = self
            .client
            .get(&self.metadata_endpoint)
            .query(&query)
            .header("Metadata", "true");

        let body = read_body(request, &self.metadata_endpoint).await?;

        parse_token_response(&body, Utc::now())
    }

    async fn fetch_with_client_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<Credential, FetchError> {
        let form_data = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("scope", credentials.scope.as_str()),
        ];

        debug!(
            "Requesting token from {} for client {}",
            credentials.token_endpoint, credentials.client_id
        );

        let request = self.client.post(&credentials.token_endpoint).form(&form_data);
        let body = read_body(request, &credentials.token_endpoint).await?;

        parse_token_response(&body, Utc::now())
    }
}

impl CredentialFetcher for HttpCredentialFetcher {
    fn fetch(&self, source: &CredentialSource) -> Result<Credential, FetchError> {
        self.runtime.block_on(self.fetch_async(source))
    }
}

/// Only a request that cannot complete is a transport failure. A rejected request
/// still produced a response, which carries no token.
async fn read_body(request: reqwest::RequestBuilder, endpoint: &str) -> Result<String, FetchError> {
    let transport = |error| FetchError::Transport {
        endpoint: endpoint.to_owned(),
        error,
    };

    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if !status.is_success() {
        let reason = error_description(&body).unwrap_or_else(|| body.trim().to_owned());
        warn!("Token request to {endpoint} was rejected with {status}: {reason}");
        return Err(FetchError::Parse(format!(
            "{endpoint} answered {status} without an access_token: {reason}"
        )));
    }

    Ok(body)
}
