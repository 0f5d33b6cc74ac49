//! Sync coordinator.
//!
//! Owns the in-memory document and footer config and keeps them in step
//! with device storage and the hosted document. Device storage is the
//! durable copy; the hosted document is best effort:
//!
//! - load reads the device copy first, then lets the hosted document
//!   replace whatever fields it supplies
//! - save writes the device copy (a failure blocks), then replaces the
//!   hosted document in full (a failure never rolls back the device copy)
//! - until the hosted document confirms a save, a device-local marker
//!   keeps later loads from adopting the older hosted copy
//!
//! Mutating operations take `&mut self`, so two saves never interleave.
//! Status changes are published on a [`watch`] channel.

mod error;
mod status;

pub use error::SyncError;
pub use status::{
    LoadReport, RemoteLoad, RemoteSave, SaveReport, SyncIssue, SyncMode, SyncStatus,
};

use serde::Serialize;
use tokio::sync::watch;

use crate::auth::EditorSession;
use crate::models::{default_document, AppConfig, WorkflowDocument};
use crate::remote::{RemoteError, RemoteSnapshot, RemoteStore};
use crate::resolver::CredentialResolver;
use crate::session::{Draft, EditSession};
use crate::store::{LocalStore, LocalStoreExt, StorageError, StorageKey};

/// Which shared records a save writes.
#[derive(Debug, Clone, Copy)]
enum Changed {
    Document,
    Config,
    All,
}

impl Changed {
    fn keys(self) -> Vec<StorageKey> {
        match self {
            Changed::Document => vec![StorageKey::WorkflowData],
            Changed::Config => vec![StorageKey::AppConfig],
            Changed::All => vec![StorageKey::WorkflowData, StorageKey::AppConfig],
        }
    }
}

pub struct SyncCoordinator<L, R> {
    local: L,
    remote: R,
    resolver: CredentialResolver,
    document: WorkflowDocument,
    config: AppConfig,
    status: watch::Sender<SyncStatus>,
}

impl<L: LocalStore, R: RemoteStore> SyncCoordinator<L, R> {
    /// Creates a coordinator holding the built-in defaults. Call
    /// [`Self::load`] to pick up stored data.
    pub fn new(local: L, remote: R, resolver: CredentialResolver) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            local,
            remote,
            resolver,
            document: default_document(),
            config: AppConfig::default(),
            status,
        }
    }

    pub fn document(&self) -> &WorkflowDocument {
        &self.document
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut CredentialResolver {
        &mut self.resolver
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Opens an edit session, adopting the credential entered at login.
    pub fn begin_session(&mut self, editor: &EditorSession) -> EditSession {
        self.resolver.begin_session(editor);
        EditSession::new(editor)
    }

    /// Closes an edit session and forgets its credential. Device settings
    /// are kept.
    pub fn end_session(&mut self, _session: EditSession) {
        self.resolver.end_session();
    }

    /// Loads the device copy, then the hosted document when one is
    /// configured. Never fails: a remote problem leaves the device copy
    /// in place and is reported as a [`SyncIssue::RemoteRead`].
    ///
    /// While the device holds unpublished changes the hosted document is
    /// not read, and the report says [`RemoteLoad::PendingLocal`].
    pub async fn load(&mut self) -> LoadReport {
        self.update_status(|s| s.mode = SyncMode::Loading);

        let local_document: Option<WorkflowDocument> =
            self.local.load_json(StorageKey::WorkflowData);
        let local_config: Option<AppConfig> = self.local.load_json(StorageKey::AppConfig);
        let pending = self
            .local
            .load_json::<bool>(StorageKey::PendingSync)
            .unwrap_or(false);

        let mut report = LoadReport {
            local_document: local_document.is_some(),
            local_config: local_config.is_some(),
            remote: RemoteLoad::NotConfigured,
        };
        if let Some(document) = local_document {
            self.document = document;
        }
        if let Some(config) = local_config {
            self.config = config;
        }

        let Some(endpoint) = self.resolver.endpoint(&self.local) else {
            tracing::debug!("No endpoint configured, using device data");
            self.update_status(|s| {
                s.mode = SyncMode::LocalOnly;
                s.pending_remote = false;
                s.issue = None;
            });
            return report;
        };

        if pending && (report.local_document || report.local_config) {
            tracing::warn!(%endpoint, "Device has unpublished changes, not reading the cloud copy");
            self.update_status(|s| {
                s.mode = SyncMode::LocalOnly;
                s.pending_remote = true;
                s.issue = None;
            });
            report.remote = RemoteLoad::PendingLocal;
            return report;
        }

        let fetched = self
            .remote
            .fetch_latest(&endpoint, self.resolver.read_credential())
            .await;

        report.remote = match fetched {
            Ok(snapshot) => {
                let remote = RemoteLoad::Synced {
                    document: snapshot.workflow_data.is_some(),
                    config: snapshot.app_config.is_some(),
                };
                self.adopt(snapshot);
                if pending {
                    self.set_pending(false);
                }
                self.update_status(|s| {
                    s.mode = SyncMode::CloudSynced;
                    s.pending_remote = false;
                    s.issue = None;
                });
                remote
            }
            Err(e) => {
                tracing::warn!(%endpoint, "Cloud read failed, using device data: {}", e);
                self.update_status(|s| {
                    s.mode = SyncMode::LocalOnly;
                    s.issue = Some(SyncIssue::RemoteRead(e.clone()));
                });
                RemoteLoad::Failed(e)
            }
        };

        report
    }

    /// Opens a draft of the step matching `input` (string or numeric id).
    pub fn edit_step(&self, session: &mut EditSession, input: &str) -> Result<(), SyncError> {
        let step = self
            .document
            .find(input)
            .ok_or_else(|| SyncError::StepNotFound(input.trim().to_string()))?;
        session.begin_step(step);
        Ok(())
    }

    /// Opens a draft of the footer config.
    pub fn edit_config(&self, session: &mut EditSession) {
        session.begin_config(&self.config);
    }

    /// Merges the session's draft and saves it.
    ///
    /// A step draft replaces only the step with the draft's original id.
    /// The draft is consumed, even if the device write then fails; the
    /// merged state stays in memory so the edit is not lost.
    pub async fn commit(&mut self, session: &mut EditSession) -> Result<SaveReport, SyncError> {
        let changed = match session.take() {
            None => return Err(SyncError::NothingToCommit),
            Some(Draft::Step(draft)) => {
                let (id, step) = draft.build();
                self.document.replace_step(&id, step)?;
                Changed::Document
            }
            Some(Draft::Config(draft)) => {
                self.config = draft.build();
                Changed::Config
            }
        };

        self.save(changed).await
    }

    /// Saves the current document and config without an edit, e.g. to seed
    /// a new endpoint.
    pub async fn publish(&mut self, _session: &EditSession) -> Result<SaveReport, SyncError> {
        self.save(Changed::All).await
    }

    /// Removes the device copy and restores the built-in defaults in
    /// memory. Device settings and the hosted document are left alone.
    pub fn reset_to_defaults(&mut self, _session: &EditSession) -> Result<(), SyncError> {
        self.local.remove(StorageKey::WorkflowData)?;
        self.local.remove(StorageKey::AppConfig)?;
        self.local.remove(StorageKey::PendingSync)?;

        self.document = default_document();
        self.config = AppConfig::default();
        tracing::debug!("Restored built-in defaults");

        self.update_status(|s| {
            s.mode = SyncMode::LocalOnly;
            s.local_saved = false;
            s.pending_remote = false;
            s.issue = None;
        });
        Ok(())
    }

    async fn save(&mut self, changed: Changed) -> Result<SaveReport, SyncError> {
        let previous = self.status.borrow().mode;
        self.update_status(|s| {
            s.mode = SyncMode::Saving;
            s.local_saved = false;
        });

        if let Err(e) = self.write_local(changed) {
            tracing::warn!("Device save failed: {}", e);
            self.update_status(|s| s.mode = previous);
            return Err(SyncError::LocalStorage(e));
        }

        let saved = changed.keys();
        let endpoint = self.resolver.endpoint(&self.local);
        self.update_status(|s| {
            s.local_saved = true;
            s.pending_remote = endpoint.is_some();
        });

        let Some(endpoint) = endpoint else {
            self.update_status(|s| {
                s.mode = SyncMode::LocalOnly;
                s.issue = None;
            });
            return Ok(SaveReport {
                saved,
                remote: RemoteSave::LocalOnly,
            });
        };
        self.set_pending(true);

        let Some(credential) = self.resolver.effective_write_credential(&self.local) else {
            return Ok(self.credential_needed(saved));
        };

        let snapshot = RemoteSnapshot::full(self.document.clone(), self.config.clone());
        let result = self.remote.replace(&endpoint, &credential, &snapshot).await;

        let remote = match result {
            Ok(()) => {
                tracing::debug!(%endpoint, "Published to cloud");
                self.set_pending(false);
                self.update_status(|s| {
                    s.mode = SyncMode::CloudSynced;
                    s.pending_remote = false;
                    s.issue = None;
                });
                RemoteSave::Synced
            }
            Err(RemoteError::MissingWriteCredential) => return Ok(self.credential_needed(saved)),
            Err(e) => {
                tracing::warn!(%endpoint, "Cloud write failed, change kept on this device: {}", e);
                self.update_status(|s| {
                    s.mode = SyncMode::LocalOnly;
                    s.issue = Some(SyncIssue::RemoteWrite(e.clone()));
                });
                RemoteSave::Failed(e)
            }
        };

        Ok(SaveReport { saved, remote })
    }

    fn credential_needed(&self, saved: Vec<StorageKey>) -> SaveReport {
        tracing::warn!("No write credential, change kept on this device");
        self.update_status(|s| {
            s.mode = SyncMode::LocalOnly;
            s.issue = Some(SyncIssue::CredentialNeeded);
        });
        SaveReport {
            saved,
            remote: RemoteSave::CredentialNeeded,
        }
    }

    fn write_local(&self, changed: Changed) -> Result<(), StorageError> {
        if matches!(changed, Changed::Document | Changed::All) {
            self.local.save_json(StorageKey::WorkflowData, &self.document)?;
        }
        if matches!(changed, Changed::Config | Changed::All) {
            self.local.save_json(StorageKey::AppConfig, &self.config)?;
        }
        Ok(())
    }

    /// Records whether the device copy is ahead of the hosted document.
    /// A failure is logged; the device copy itself is already saved.
    fn set_pending(&self, pending: bool) {
        let result = if pending {
            self.local.save_json(StorageKey::PendingSync, &true)
        } else {
            self.local.remove(StorageKey::PendingSync)
        };
        if let Err(e) = result {
            tracing::warn!("Failed to record unpublished changes: {}", e);
        }
    }

    fn adopt(&mut self, snapshot: RemoteSnapshot) {
        if let Some(document) = snapshot.workflow_data {
            self.mirror(StorageKey::WorkflowData, &document);
            self.document = document;
        }
        if let Some(config) = snapshot.app_config {
            self.mirror(StorageKey::AppConfig, &config);
            self.config = config;
        }
    }

    fn mirror<T: Serialize>(&self, key: StorageKey, value: &T) {
        if let Err(e) = self.local.save_json(key, value) {
            tracing::warn!(%key, "Failed to keep a device copy of cloud data: {}", e);
        }
    }

    fn update_status(&self, modify: impl FnOnce(&mut SyncStatus)) {
        self.status.send_modify(modify);
        tracing::debug!(mode = %self.status.borrow().mode, "Sync status updated");
    }
}
