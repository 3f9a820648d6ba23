//! Blocking HTTP client shared by release sources.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default time allowed for a single request, body included.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client with an optional bearer token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    token: Option<String>,
    timeout: Duration,
    verify_ssl: bool,
}

impl HttpClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(timeout, true)
    }

    /// Create a client that skips TLS certificate checks unless `verify_ssl`.
    pub fn with_verify_ssl(verify_ssl: bool) -> Result<Self> {
        Self::build(DEFAULT_HTTP_TIMEOUT, verify_ssl)
    }

    fn build(timeout: Duration, verify_ssl: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("toolup/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            token: None,
            timeout,
            verify_ssl,
        })
    }

    /// Send `token` as a bearer token on every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// A copy of this client that sends no token.
    pub fn without_token(&self) -> Self {
        Self {
            token: None,
            ..self.clone()
        }
    }

    /// Whether TLS certificates are verified.
    pub fn verifies_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn get(&self, url: &str, accept: &str) -> Result<Response> {
        let mut request = self.client.get(url).header("Accept", accept);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .with_context(|| format!("Failed to request {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }
        Ok(response)
    }

    /// Fetch and deserialize a JSON document.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get(url, "application/vnd.github+json")?
            .json()
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Fetch a body as text.
    pub fn get_text(&self, url: &str) -> Result<String> {
        self.get(url, "text/plain")?
            .text()
            .with_context(|| format!("Failed to read response from {}", url))
    }

    /// Fetch a body as raw bytes.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(url, "application/octet-stream")?
            .bytes()
            .with_context(|| format!("Failed to read response from {}", url))?;
        Ok(bytes.to_vec())
    }
}
