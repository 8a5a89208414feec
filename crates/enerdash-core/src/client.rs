//! HTTP transport for the energy simulation backend.
//!
//! [`Transport`] is the seam between the synchronization core and the
//! wire: the poll loop and the edit dispatcher only ever see this trait,
//! so tests swap in [`crate::mock::MockTransport`] while production uses
//! [`HttpClient`] over reqwest.
//!
//! # Example
//!
//! ```no_run
//! use enerdash_core::HttpClient;
//! use enerdash_types::DeviceKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use enerdash_core::Transport;
//!
//! let client = HttpClient::new("http://localhost:5000")?;
//! let info = client.version().await?;
//! println!("backend version: {}", info.version);
//!
//! let meter = client.fetch(DeviceKind::PowerMeter).await?;
//! println!("fields: {}", meter.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use enerdash_types::DeviceKind;

use crate::error::{Error, Result};

/// Backend access as the core sees it: one GET and one partial POST per
/// device endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the current state object of a device.
    async fn fetch(&self, kind: DeviceKind) -> Result<Map<String, Value>>;

    /// Post a partial update carrying only changed fields. The returned
    /// ack is not authoritative; the next poll is.
    async fn send(&self, kind: DeviceKind, body: Value) -> Result<Value>;
}

/// Version report from the backend's `/api` index.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    /// Backend version string.
    pub version: String,
}

/// HTTP client for the simulation backend REST API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the backend (e.g., "http://localhost:5000")
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for URLs without an http(s) scheme.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(Error::Request)?;
        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the backend is reachable.
    pub async fn is_reachable(&self) -> bool {
        self.version().await.is_ok()
    }

    /// Get the backend version from `/api`.
    pub async fn version(&self) -> Result<ApiInfo> {
        let url = format!("{}/api", self.base_url);
        let value = self.get_json(&url).await?;
        serde_json::from_value(value).map_err(|e| Error::Payload { url, source: e })
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    /// GET a URL and parse the body as JSON.
    ///
    /// The body is read as text first so a malformed payload surfaces as
    /// a parse failure distinct from the network failure cases.
    async fn get_json(&self, url: &str) -> Result<Value> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::NotReachable {
                    url: url.to_string(),
                    source: e,
                })?;
        self.handle_response(url, response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::NotReachable {
                url: url.to_string(),
                source: e,
            })?;
        self.handle_response(url, response).await
    }

    async fn handle_response(&self, url: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.map_err(Error::Request)?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| status.to_string());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::Payload {
            url: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn fetch(&self, kind: DeviceKind) -> Result<Map<String, Value>> {
        let url = format!("{}{}", self.base_url, kind.endpoint());
        let value = self.get_json(&url).await?;
        serde_json::from_value(value).map_err(|e| Error::Payload { url, source: e })
    }

    async fn send(&self, kind: DeviceKind, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, kind.endpoint());
        self.post_json(&url, &body).await
    }
}
