//! Procflow Core Library
//!
//! Workflow model, device and hosted storage, and the sync logic shared by
//! the procflow applications.

pub mod auth;
pub mod coordinator;
pub mod models;
pub mod remote;
pub mod resolver;
pub mod session;
pub mod store;

pub use auth::{hash_passphrase, AuthError, EditorGate, EditorSession};
pub use coordinator::{
    LoadReport, RemoteLoad, RemoteSave, SaveReport, SyncCoordinator, SyncError, SyncIssue,
    SyncMode, SyncStatus,
};
pub use models::{
    default_document, default_steps, AmountFilter, AppConfig, DocEntry, DocItem, Documents,
    ModelError, StepId, SubTask, WorkflowDocument, WorkflowStep,
};
pub use remote::{EndpointId, JsonBinClient, RemoteError, RemoteSnapshot, RemoteStore};
pub use resolver::{CredentialResolver, RemoteDefaults, SyncSettings, ValueSource};
pub use session::{ConfigDraft, DocList, Draft, DraftError, EditSession, StepDraft};
pub use store::{FileStore, LocalStore, LocalStoreExt, StorageError, StorageKey};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
