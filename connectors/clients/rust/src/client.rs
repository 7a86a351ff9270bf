// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! fleetq client configuration, authentication, and HTTP transport layer.
//!
//! [`FleetqClient`] is the primary entry point for all SDK operations. It
//! owns the base URL, HTTP client, authentication credentials, and timeout
//! settings. Endpoint methods (device queries, templates, catalogs) are
//! defined as `impl FleetqClient` blocks in their respective modules.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{FleetqError, Result};
use crate::types::ErrorResponse;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Authentication method for connecting to the inventory service.
#[derive(Debug, Clone)]
pub enum Auth {
    /// No authentication (local development, trusted networks).
    None,
    /// API key passed via the `X-API-Key` header.
    ApiKey(String),
    /// Bearer token passed via the `Authorization: Bearer <token>` header.
    Bearer(String),
    /// HTTP Basic authentication.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
}

// ---------------------------------------------------------------------------
// FleetqClient
// ---------------------------------------------------------------------------

/// The main fleetq client.
///
/// # Examples
///
/// ```rust,no_run
/// use fleetq_client::client::FleetqClient;
///
/// # #[tokio::main]
/// # async fn main() -> fleetq_client::error::Result<()> {
/// let client = FleetqClient::new("http://localhost:8080")?;
/// assert!(client.health().await?);
/// # Ok(())
/// # }
/// ```
pub struct FleetqClient {
    /// Parsed base URL of the inventory service (e.g. `http://localhost:8080`).
    base_url: Url,
    /// Underlying `reqwest` HTTP client (connection-pooled).
    http: reqwest::Client,
    auth: Auth,
    /// Per-request timeout.
    timeout: Duration,
}

impl FleetqClient {
    // -- Constructors -------------------------------------------------------

    /// Create a new unauthenticated client pointing at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FleetqError::Validation`] if `base_url` cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, Auth::None)
    }

    /// Create a client that authenticates via an API key header.
    pub fn with_api_key(base_url: &str, key: &str) -> Result<Self> {
        Self::build(base_url, Auth::ApiKey(key.to_owned()))
    }

    /// Create a client that authenticates via a bearer token.
    pub fn with_bearer(base_url: &str, token: &str) -> Result<Self> {
        Self::build(base_url, Auth::Bearer(token.to_owned()))
    }

    /// Create a client that authenticates via HTTP Basic credentials.
    pub fn with_basic(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Self::build(
            base_url,
            Auth::Basic {
                username: username.to_owned(),
                password: password.to_owned(),
            },
        )
    }

    /// Shared by all constructors.
    pub fn build(base_url: &str, auth: Auth) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FleetqError::Validation(format!("Invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FleetqError::Validation(format!(
                "Invalid base URL: {base_url} cannot carry paths"
            )));
        }

        // reqwest's no-provider TLS needs a process-wide default; a lost
        // race to install it leaves the winner in place.
        let _ = rustls::crypto::ring::default_provider().install_default();
        let http = reqwest::Client::builder()
            .build()
            .map_err(FleetqError::Network)?;

        Ok(Self {
            base_url,
            http,
            auth,
            timeout: Duration::from_secs(30),
        })
    }

    // -- Health check -------------------------------------------------------

    /// Returns `true` if the service is reachable and reports healthy.
    pub async fn health(&self) -> Result<bool> {
        let url = self.url("/health", &[])?;
        let response = self
            .request(self.http.get(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(response.status().is_success())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set a custom per-request timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    // -- Internal HTTP helpers ----------------------------------------------

    /// Join `path` onto the base URL and append `query` pairs, encoded.
    pub(crate) fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FleetqError::Validation(format!("Invalid path {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Attach authentication headers and the timeout.
    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.timeout(self.timeout);
        match &self.auth {
            Auth::None => builder,
            Auth::ApiKey(key) => builder.header("X-API-Key", key.as_str()),
            Auth::Bearer(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> FleetqError {
        if err.is_timeout() {
            FleetqError::Timeout(self.timeout.as_millis() as u64)
        } else {
            FleetqError::Network(err)
        }
    }

    /// Perform a GET request and deserialize the JSON response body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path, query)?;
        debug!(%url, "GET");
        let response = self
            .request(self.http.get(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(response).await
    }

    /// Perform a POST request with a JSON body and deserialize the response.
    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path, &[])?;
        debug!(%url, "POST");
        let response = self
            .request(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(response).await
    }

    /// Perform a DELETE request. Returns `()` on success.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path, &[])?;
        debug!(%url, "DELETE");
        let response = self
            .request(self.http.delete(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.extract_error(response).await)
        }
    }

    // -- Response handling --------------------------------------------------

    /// Deserialize a successful response or extract an error from the body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if response.status().is_success() {
            let body = response.text().await.map_err(|e| self.transport_error(e))?;
            serde_json::from_str(&body).map_err(FleetqError::Serialization)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Turn a non-2xx response into the appropriate [`FleetqError`] variant.
    async fn extract_error(&self, response: reqwest::Response) -> FleetqError {
        let status = response.status().as_u16();

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) if !body.message.is_empty() => body.message,
            _ => format!("HTTP {status}"),
        };

        match status {
            404 => FleetqError::NotFound(message),
            401 | 403 => FleetqError::Unauthorized(message),
            _ => FleetqError::Server { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_constructor_builds_a_client() {
        assert!(FleetqClient::new("http://localhost:8080").is_ok());
        assert!(FleetqClient::with_api_key("https://inventory.example.com", "k").is_ok());
        assert!(FleetqClient::with_basic("http://localhost:8080", "ops", "pw").is_ok());

        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| FleetqClient::new("https://localhost:8443").is_ok()))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(FleetqClient::new("not a url"), Err(FleetqError::Validation(_))));
        assert!(matches!(FleetqClient::new("mailto:ops@example.com"), Err(FleetqError::Validation(_))));
    }

    #[test]
    fn test_url_encodes_query_pairs() {
        let client = FleetqClient::new("http://localhost:8080").unwrap();
        let url = client
            .url("/api/v1/filters/nodeLabel/values", &[("key", "topology.kubernetes.io/zone")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v1/filters/nodeLabel/values?key=topology.kubernetes.io%2Fzone"
        );
    }

    #[test]
    fn test_default_timeout() {
        let mut client = FleetqClient::with_bearer("http://localhost:8080", "t").unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(30));
        client.set_timeout(Duration::from_secs(5));
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }
}
