//! Hosted document store access.
//!
//! [`RemoteStore`] is the seam the sync coordinator talks to;
//! [`JsonBinClient`] is the HTTP implementation.

mod client;
mod error;
mod protocol;

use async_trait::async_trait;

pub use client::{JsonBinClient, DEFAULT_TIMEOUT};
pub use error::RemoteError;
pub use protocol::{
    decode_snapshot, EndpointError, EndpointId, RemoteSnapshot, ACCESS_KEY_HEADER,
    BIN_META_HEADER, DEFAULT_BASE_URL, MASTER_KEY_HEADER, MIN_ENDPOINT_ID_LEN,
};

/// Read and full-replace access to one hosted document.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the latest snapshot. The read credential is only sent when present.
    async fn fetch_latest(
        &self,
        endpoint: &EndpointId,
        read_credential: Option<&str>,
    ) -> Result<RemoteSnapshot, RemoteError>;

    /// Replaces the whole document. A blank credential fails with
    /// [`RemoteError::MissingWriteCredential`] without touching the network.
    async fn replace(
        &self,
        endpoint: &EndpointId,
        write_credential: &str,
        snapshot: &RemoteSnapshot,
    ) -> Result<(), RemoteError>;
}
