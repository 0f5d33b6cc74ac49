//! Sync state and operation reports.

use std::fmt;

use crate::remote::RemoteError;
use crate::store::StorageKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    #[default]
    Idle,
    Loading,
    /// Only device storage is in use.
    LocalOnly,
    /// The in-memory state matches the hosted document as of the last exchange.
    CloudSynced,
    Saving,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Idle => write!(f, "idle"),
            SyncMode::Loading => write!(f, "loading"),
            SyncMode::LocalOnly => write!(f, "local only"),
            SyncMode::CloudSynced => write!(f, "cloud synced"),
            SyncMode::Saving => write!(f, "saving"),
        }
    }
}

/// A degraded condition that does not block use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncIssue {
    RemoteRead(RemoteError),
    RemoteWrite(RemoteError),
    CredentialNeeded,
}

impl fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncIssue::RemoteRead(e) => write!(f, "Cloud read failed, showing local data: {}", e),
            SyncIssue::RemoteWrite(e) => write!(f, "Saved locally, cloud write failed: {}", e),
            SyncIssue::CredentialNeeded => {
                write!(f, "Saved locally, a write key is needed to publish")
            }
        }
    }
}

/// Observable sync state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus {
    pub mode: SyncMode,
    /// The last save reached device storage. Set before any network wait.
    pub local_saved: bool,
    /// Local changes the hosted document has not confirmed yet.
    pub pending_remote: bool,
    pub issue: Option<SyncIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLoad {
    NotConfigured,
    /// Which fields the hosted document supplied.
    Synced { document: bool, config: bool },
    /// The device holds changes the hosted document has not confirmed, so
    /// the hosted document was not read.
    PendingLocal,
    Failed(RemoteError),
}

/// Outcome of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub local_document: bool,
    pub local_config: bool,
    pub remote: RemoteLoad,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSave {
    /// No usable endpoint; the device copy is the only one.
    LocalOnly,
    CredentialNeeded,
    Synced,
    Failed(RemoteError),
}

/// Outcome of a save whose local write succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: Vec<StorageKey>,
    pub remote: RemoteSave,
}

impl SaveReport {
    pub fn is_published(&self) -> bool {
        self.remote == RemoteSave::Synced
    }
}
