//! Device-local persistence.
//!
//! A [`LocalStore`] is a small key/value store of JSON text. Reads are
//! forgiving: a missing key, an unreadable file or a value that does not
//! parse are all "absent" to callers of [`LocalStoreExt::load_json`].
//! Writes report every failure so the caller can tell the user their
//! only durable copy was not saved.

mod file;
mod key;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub use file::FileStore;
pub use key::StorageKey;

/// Errors that can occur during local storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode {0}: {1}")]
    Encode(StorageKey, #[source] serde_json::Error),
}

/// Raw access to device storage.
pub trait LocalStore {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError>;
    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: StorageKey) -> Result<(), StorageError>;
}

impl<S: LocalStore + ?Sized> LocalStore for &S {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Typed JSON helpers on top of [`LocalStore`].
pub trait LocalStoreExt: LocalStore {
    /// Loads and decodes a record; anything other than a clean decode is absent.
    fn load_json<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let text = match self.read(key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%key, "Failed to read local record: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%key, "Ignoring malformed local record: {}", e);
                None
            }
        }
    }

    /// Encodes and writes a record.
    fn save_json<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value).map_err(|e| StorageError::Encode(key, e))?;
        self.write(key, &text)
    }
}

impl<S: LocalStore + ?Sized> LocalStoreExt for S {}


#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use crate::models::{default_document, AppConfig, WorkflowDocument};

    #[test]
    fn test_load_missing_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<AppConfig> = store.load_json(StorageKey::AppConfig);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_and_load_document() {
        let store = MemoryStore::new();
        let doc = default_document();

        store.save_json(StorageKey::WorkflowData, &doc).unwrap();
        let loaded: WorkflowDocument = store.load_json(StorageKey::WorkflowData).unwrap();

        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_malformed_record_is_none() {
        let store = MemoryStore::new();
        store.write(StorageKey::AppConfig, "{not json").unwrap();
        let loaded: Option<AppConfig> = store.load_json(StorageKey::AppConfig);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_duplicate_ids_are_treated_as_absent() {
        let store = MemoryStore::new();
        store
            .write(
                StorageKey::WorkflowData,
                r#"[{"id": "a", "title": "x"}, {"id": "a", "title": "y"}]"#,
            )
            .unwrap();
        let loaded: Option<WorkflowDocument> = store.load_json(StorageKey::WorkflowData);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_store_by_reference() {
        let store = MemoryStore::new();
        let by_ref = &store;
        by_ref.save_json(StorageKey::EndpointOverride, "bin").unwrap();
        assert_eq!(store.raw(StorageKey::EndpointOverride).as_deref(), Some("\"bin\""));
    }
}
