//! Fixed keys for device-local records.

/// Records kept in device storage.
///
/// The workflow document and its footer config are the local copy of the
/// shared data; the write credential and endpoint override are device
/// settings and are never synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    WorkflowData,
    AppConfig,
    WriteCredential,
    EndpointOverride,
    /// Set while the device copy holds changes the hosted document has not
    /// confirmed.
    PendingSync,
}

impl StorageKey {
    /// Returns the key name.
    pub fn name(&self) -> &'static str {
        match self {
            StorageKey::WorkflowData => "admin_workflow_data_v1",
            StorageKey::AppConfig => "admin_workflow_config_v1",
            StorageKey::WriteCredential => "admin_master_key",
            StorageKey::EndpointOverride => "custom_bin_id",
            StorageKey::PendingSync => "admin_pending_sync_v1",
        }
    }

    /// Returns the filename used by file-backed stores.
    pub fn filename(&self) -> String {
        format!("{}.json", self.name())
    }

    /// Whether the record holds a secret that must not appear in logs.
    pub fn is_secret(&self) -> bool {
        matches!(self, StorageKey::WriteCredential)
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
