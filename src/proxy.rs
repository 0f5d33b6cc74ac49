//! Credential-forwarding proxy for the hosted document store.
//!
//! Clients talk the same protocol as the store itself, so `flow` can point
//! `remote.base_url` here. The proxy checks the caller's key against its own
//! client key and forwards the request with the upstream key, which never
//! leaves the server.
//!
//! # Configuration
//!
//! Environment variables:
//! - `PROCFLOW_PROXY_PORT`: Port to listen on (default: 8080)
//! - `PROCFLOW_PROXY_UPSTREAM`: Store base URL (default: the public JSONBin API)
//! - `PROCFLOW_PROXY_UPSTREAM_KEY`: Key sent upstream as `X-Master-Key`
//! - `PROCFLOW_PROXY_CLIENT_KEY`: Key callers must present (default: the upstream key)
//! - `PROCFLOW_PROXY_BIN_ID`: Only serve this document
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /{bin}/latest`, `GET /{bin}`: Latest document (`X-Master-Key` or `X-Access-Key`)
//! - `PUT /{bin}`: Replace the document (`X-Master-Key`)

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use procflow_core::remote::{
    EndpointId, ACCESS_KEY_HEADER, BIN_META_HEADER, DEFAULT_BASE_URL, MASTER_KEY_HEADER,
};
use procflow_core::{JsonBinClient, RemoteError};

// ============================================================================
// Configuration
// ============================================================================

/// Proxy configuration
#[derive(Clone)]
pub struct ProxyConfig {
    /// Port to listen on
    pub port: u16,
    /// Store base URL
    pub upstream: String,
    /// Key sent upstream
    pub upstream_key: Option<String>,
    /// Key callers must present
    pub client_key: Option<String>,
    /// Only document this proxy serves, if set
    pub pinned_bin: Option<String>,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProxyConfig")
            .field("port", &self.port)
            .field("upstream", &self.upstream)
            .field("upstream_key", &redacted(&self.upstream_key))
            .field("client_key", &redacted(&self.client_key))
            .field("pinned_bin", &self.pinned_bin)
            .finish()
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = env("PROCFLOW_PROXY_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let upstream = env("PROCFLOW_PROXY_UPSTREAM").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let upstream_key = env("PROCFLOW_PROXY_UPSTREAM_KEY");
        let client_key = env("PROCFLOW_PROXY_CLIENT_KEY").or_else(|| upstream_key.clone());

        Self {
            port,
            upstream,
            upstream_key,
            client_key,
            pinned_bin: env("PROCFLOW_PROXY_BIN_ID"),
        }
    }
}

// ============================================================================
// State and errors
// ============================================================================

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    upstream: Arc<JsonBinClient>,
    upstream_key: Option<Arc<str>>,
    client_key: Option<[u8; 32]>,
    pinned_bin: Option<Arc<str>>,
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            upstream: Arc::new(JsonBinClient::new(config.upstream.clone())?),
            upstream_key: config.upstream_key.as_deref().map(Arc::from),
            client_key: config.client_key.as_deref().map(digest),
            pinned_bin: config.pinned_bin.as_deref().map(|b| Arc::from(b.trim())),
        })
    }

    /// Whether callers can authenticate at all.
    pub fn accepts_clients(&self) -> bool {
        self.client_key.is_some()
    }

    fn authorize(&self, headers: &HeaderMap, access: Access) -> Result<(), ProxyError> {
        let Some(expected) = &self.client_key else {
            return Err(ProxyError::Forbidden);
        };

        let mut names = vec![MASTER_KEY_HEADER];
        if access == Access::Read {
            names.push(ACCESS_KEY_HEADER);
        }
        let presented = names
            .into_iter()
            .filter_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
            .any(|key| digest(key) == *expected);

        if presented {
            Ok(())
        } else {
            Err(ProxyError::Forbidden)
        }
    }

    fn endpoint(&self, bin: &str) -> Result<EndpointId, ProxyError> {
        let endpoint = EndpointId::parse(bin).map_err(|e| ProxyError::InvalidBin(e.to_string()))?;
        match &self.pinned_bin {
            Some(pinned) if pinned.as_ref() != endpoint.as_str() => Err(ProxyError::UnknownBin),
            _ => Ok(endpoint),
        }
    }

    fn with_upstream_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.upstream_key {
            Some(key) => request.header(MASTER_KEY_HEADER, key.as_ref()),
            None => request,
        }
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.trim().as_bytes()).into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
enum ProxyError {
    Forbidden,
    MethodNotAllowed,
    InvalidBin(String),
    UnknownBin,
    InvalidBody(String),
    Upstream(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ProxyError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Forbidden: invalid API key.".to_string(),
            ),
            ProxyError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "Method Not Allowed".to_string(),
            ),
            ProxyError::InvalidBin(message) => (StatusCode::BAD_REQUEST, "invalid_bin", message),
            ProxyError::UnknownBin => (
                StatusCode::NOT_FOUND,
                "unknown_bin",
                "This proxy does not serve that document".to_string(),
            ),
            ProxyError::InvalidBody(message) => (StatusCode::BAD_REQUEST, "invalid_body", message),
            ProxyError::Upstream(message) => {
                tracing::warn!("Upstream request failed: {}", message);
                (StatusCode::BAD_GATEWAY, "upstream_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn read_latest(
    State(state): State<AppState>,
    Path(bin): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ProxyError> {
    state.authorize(&headers, Access::Read)?;
    let endpoint = state.endpoint(&bin)?;

    let mut request = state.upstream.http().get(state.upstream.latest_url(&endpoint));
    if let Some(meta) = headers.get(BIN_META_HEADER) {
        request = request.header(BIN_META_HEADER, meta.as_bytes());
    }
    forward(state.with_upstream_key(request)).await
}

async fn replace(
    State(state): State<AppState>,
    Path(bin): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    state.authorize(&headers, Access::Write)?;
    let endpoint = state.endpoint(&bin)?;

    let document: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ProxyError::InvalidBody(format!("Body is not JSON: {}", e)))?;

    tracing::info!(%endpoint, "Forwarding document replace");
    let request = state
        .upstream
        .http()
        .put(state.upstream.document_url(&endpoint))
        .json(&document);
    forward(state.with_upstream_key(request)).await
}

/// Rejects other methods, after the key check so unauthenticated callers
/// learn nothing about the routes.
async fn method_not_allowed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ProxyError> {
    state.authorize(&headers, Access::Read)?;
    Err(ProxyError::MethodNotAllowed)
}

/// Sends the request upstream and relays its status and JSON body.
async fn forward(request: reqwest::RequestBuilder) -> Result<Response, ProxyError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(format!("Upstream unreachable: {}", e)))?;

    let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ProxyError::Upstream(format!("Upstream returned a non-JSON body: {}", e)))?;

    Ok((status, Json(body)).into_response())
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(health));

    // Document routes (key checked per handler)
    let document_routes = Router::new()
        .route(
            "/{bin}/latest",
            get(read_latest).fallback(method_not_allowed),
        )
        .route(
            "/{bin}",
            get(read_latest).put(replace).fallback(method_not_allowed),
        );

    Router::new()
        .merge(public_routes)
        .merge(document_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
