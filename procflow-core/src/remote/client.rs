//! HTTP client for the hosted JSON document store.

use std::time::Duration;

use async_trait::async_trait;

use super::protocol::{
    decode_snapshot, EndpointId, RemoteSnapshot, ACCESS_KEY_HEADER, BIN_META_HEADER,
    DEFAULT_BASE_URL, MASTER_KEY_HEADER,
};
use super::{RemoteError, RemoteStore};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for a JSONBin-compatible store, or for a proxy speaking the
/// same protocol.
///
/// Every call is a single attempt; there is no retry.
#[derive(Debug, Clone)]
pub struct JsonBinClient {
    base_url: String,
    http: reqwest::Client,
}

impl JsonBinClient {
    /// Creates a client for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying HTTP client, with the configured timeout.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// URL of the endpoint's document.
    pub fn document_url(&self, endpoint: &EndpointId) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// URL of the endpoint's latest snapshot.
    pub fn latest_url(&self, endpoint: &EndpointId) -> String {
        format!("{}/{}/latest", self.base_url, endpoint)
    }
}

impl Default for JsonBinClient {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RemoteStore for JsonBinClient {
    async fn fetch_latest(
        &self,
        endpoint: &EndpointId,
        read_credential: Option<&str>,
    ) -> Result<RemoteSnapshot, RemoteError> {
        let mut request = self
            .http
            .get(self.latest_url(endpoint))
            .header(BIN_META_HEADER, "false");

        if let Some(key) = read_credential.map(str::trim).filter(|k| !k.is_empty()) {
            request = request.header(ACCESS_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::from_status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        decode_snapshot(&body)
    }

    async fn replace(
        &self,
        endpoint: &EndpointId,
        write_credential: &str,
        snapshot: &RemoteSnapshot,
    ) -> Result<(), RemoteError> {
        let key = write_credential.trim();
        if key.is_empty() {
            return Err(RemoteError::MissingWriteCredential);
        }

        let response = self
            .http
            .put(self.document_url(endpoint))
            .header(MASTER_KEY_HEADER, key)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::from_status(status.as_u16()));
        }

        Ok(())
    }
}
