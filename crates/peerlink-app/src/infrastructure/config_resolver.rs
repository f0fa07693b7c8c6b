//! Resolving the transport configuration from the TURN credential service.
//!
//! # Request
//!
//! One `GET {base}/api/v1/turn/credentials?apiKey={key}`, where `base`
//! defaults to `https://{project}.metered.live`.  The body is the ICE server
//! list, either as a bare JSON array or wrapped in `{"iceServers": [...]}`.
//! There is no retry.
//!
//! # Fetch boundary
//!
//! The HTTP call sits behind [`CredentialFetcher`] so the resolver can be
//! tested without a network.  [`HttpCredentialFetcher`] is the reqwest
//! implementation used in production.
//!
//! The API key is passed as a query parameter and never appears in logs or
//! error messages; those only carry the endpoint without the query string.

use async_trait::async_trait;
use peerlink_core::{ConfigError, IceServer, TransportConfig};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::ResolverSettings;

/// Path of the credential endpoint below the service base URL.
pub const CREDENTIALS_PATH: &str = "/api/v1/turn/credentials";

/// Fetches the raw credential response body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialFetcher: Send + Sync {
    /// GETs `endpoint` with `api_key` as the `apiKey` query parameter and
    /// returns the body of a successful response.
    async fn fetch(&self, endpoint: &str, api_key: &str) -> Result<String, ConfigError>;
}

/// [`CredentialFetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpCredentialFetcher {
    client: reqwest::Client,
}

impl HttpCredentialFetcher {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                source: Box::new(e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CredentialFetcher for HttpCredentialFetcher {
    async fn fetch(&self, endpoint: &str, api_key: &str) -> Result<String, ConfigError> {
        let request_failed = |e: reqwest::Error| ConfigError::Request {
            endpoint: endpoint.to_string(),
            source: Box::new(e.without_url()),
        };

        let response = self
            .client
            .get(endpoint)
            .query(&[("apiKey", api_key)])
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(request_failed)
    }
}

/// [`CredentialFetcher`] that answers every request with the same body.
///
/// Used for offline runs where no credential service is reachable.
#[derive(Debug, Clone)]
pub struct StaticCredentialFetcher {
    body: String,
}

impl StaticCredentialFetcher {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// A single public STUN server and no TURN relay.
    pub fn stun_only() -> Self {
        Self::new(r#"[{"urls": "stun:stun.l.google.com:19302"}]"#)
    }
}

#[async_trait]
impl CredentialFetcher for StaticCredentialFetcher {
    async fn fetch(&self, endpoint: &str, _api_key: &str) -> Result<String, ConfigError> {
        debug!("serving static credentials instead of {endpoint}");
        Ok(self.body.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialResponse {
    List(Vec<IceServer>),
    Wrapped {
        #[serde(rename = "iceServers")]
        ice_servers: Vec<IceServer>,
    },
}

/// Parses a credential response body into ICE servers.
pub fn parse_ice_servers(body: &str) -> Result<Vec<IceServer>, ConfigError> {
    let response: CredentialResponse =
        serde_json::from_str(body).map_err(|e| ConfigError::Malformed {
            source: Box::new(e),
        })?;

    Ok(match response {
        CredentialResponse::List(servers) => servers,
        CredentialResponse::Wrapped { ice_servers } => ice_servers,
    })
}

/// Turns [`ResolverSettings`] into a [`TransportConfig`].
pub struct ConfigResolver<F = HttpCredentialFetcher> {
    settings: ResolverSettings,
    fetcher: F,
}

impl ConfigResolver<HttpCredentialFetcher> {
    /// Resolver that talks to the real credential service.
    pub fn from_settings(settings: ResolverSettings) -> Result<Self, ConfigError> {
        let fetcher = HttpCredentialFetcher::new(settings.request_timeout())?;
        Ok(Self::new(settings, fetcher))
    }
}

impl<F: CredentialFetcher> ConfigResolver<F> {
    pub fn new(settings: ResolverSettings, fetcher: F) -> Self {
        Self { settings, fetcher }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Credential endpoint for `project`, without the API key.
    pub fn credential_endpoint(&self, project: &str) -> String {
        match self.settings.credential_base_url.as_deref() {
            Some(base) => format!("{}{CREDENTIALS_PATH}", base.trim_end_matches('/')),
            None => format!("https://{project}.metered.live{CREDENTIALS_PATH}"),
        }
    }

    /// Fetches the ICE servers and combines them with the signaling endpoint.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingParameter`] if project or API key is absent or
    ///   blank.  Nothing is fetched in that case.
    /// - Whatever the fetcher reports for transport or status failures.
    /// - [`ConfigError::Malformed`] if the body is not an ICE server list.
    pub async fn resolve(&self) -> Result<TransportConfig, ConfigError> {
        let project = required(self.settings.project.as_deref(), "project")?;
        let api_key = required(self.settings.api_key.as_deref(), "api_key")?;

        let endpoint = self.credential_endpoint(project);
        debug!("fetching TURN credentials from {endpoint}");
        let body = self.fetcher.fetch(&endpoint, api_key).await?;
        let ice_servers = parse_ice_servers(&body)?;

        let signaling = self.settings.signaling.clone();
        info!(
            "resolved {} ICE server(s); signaling at {}:{}{}",
            ice_servers.len(),
            signaling.host,
            signaling.port,
            signaling.path
        );
        Ok(TransportConfig::new(ice_servers, signaling))
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingParameter { name }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
