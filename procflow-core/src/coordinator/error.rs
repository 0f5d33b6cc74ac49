use thiserror::Error;

use crate::models::ModelError;
use crate::store::StorageError;

/// Errors that block a sync operation.
///
/// Remote failures are not here: they degrade to local mode and are
/// reported through [`super::SyncStatus`] and the operation reports.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Could not save on this device: {0}")]
    LocalStorage(#[from] StorageError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Nothing to commit: no edit in progress")]
    NothingToCommit,
}
