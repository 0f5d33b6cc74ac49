//! Remote store error types.

use thiserror::Error;

/// Errors from the hosted document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No plausible endpoint id is configured.
    #[error("Remote store not configured. Set an endpoint id in config or settings.")]
    NotConfigured,

    /// A replace was requested without a write credential. No request was made.
    #[error("Write credential missing. Add a write key in settings.")]
    MissingWriteCredential,

    /// The store rejected the credential (HTTP 401 or 403).
    #[error("Remote store rejected the credential (HTTP {0}). Check your keys in settings.")]
    Unauthorized(u16),

    /// Any other non-success status.
    #[error("Remote store returned HTTP {0}")]
    Http(u16),

    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body was not a usable snapshot.
    #[error("Malformed remote payload: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Maps a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => RemoteError::Unauthorized(status),
            _ => RemoteError::Http(status),
        }
    }

    /// Whether the user should be sent to fix their credentials or endpoint.
    pub fn needs_settings(&self) -> bool {
        matches!(
            self,
            RemoteError::Unauthorized(_)
                | RemoteError::MissingWriteCredential
                | RemoteError::NotConfigured
        )
    }
}
