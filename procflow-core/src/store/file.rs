//! File-backed device storage: one JSON text file per key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{LocalStore, StorageError, StorageKey};

/// Device storage rooted at a data directory.
///
/// Layout:
/// ```text
/// ~/.local/share/procflow/
/// ├── admin_workflow_data_v1.json
/// ├── admin_workflow_config_v1.json
/// ├── admin_master_key.json
/// ├── admin_pending_sync_v1.json
/// └── custom_bin_id.json
/// ```
#[derive(Clone, Debug)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Creates a new store rooted at `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the full path for a key.
    pub fn path(&self, key: StorageKey) -> PathBuf {
        self.data_dir.join(key.filename())
    }

    /// Checks if a record exists on disk.
    pub fn exists(&self, key: StorageKey) -> bool {
        self.path(key).exists()
    }

    fn write_through(key: StorageKey, value: &str, tmp: &Path, path: &Path) -> Result<(), StorageError> {
        fs::write(tmp, value).map_err(|e| StorageError::Io(tmp.to_path_buf(), e))?;

        #[cfg(unix)]
        if key.is_secret() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp, fs::Permissions::from_mode(0o600))
                .map_err(|e| StorageError::Io(tmp.to_path_buf(), e))?;
        }

        fs::rename(tmp, path).map_err(|e| StorageError::Io(path.to_path_buf(), e))
    }
}

impl LocalStore for FileStore {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let path = self.path(key);

        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }

    /// Writes through a temporary file and a rename so a failed write never
    /// leaves a truncated record behind.
    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::Io(self.data_dir.clone(), e))?;

        let path = self.path(key);
        let tmp = self.data_dir.join(format!(".{}.tmp", key.filename()));

        let result = Self::write_through(key, value, &tmp, &path);
        if result.is_err() {
            // The temp file may hold a secret; never leave it behind.
            if let Err(e) = fs::remove_file(&tmp) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(%key, "Failed to remove temp file: {}", e);
                }
            }
        }
        result
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let path = self.path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_store_path() {
        let (store, _temp) = test_store();
        let path = store.path(StorageKey::WorkflowData);
        assert!(path.ends_with("admin_workflow_data_v1.json"));
    }

    #[test]
    fn test_read_missing_returns_none() {
        let (store, _temp) = test_store();
        assert!(store.read(StorageKey::AppConfig).unwrap().is_none());
        assert!(!store.exists(StorageKey::AppConfig));
    }

    #[test]
    fn test_write_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested_dir = temp_dir.path().join("nested").join("data");
        let store = FileStore::new(nested_dir.clone());

        store.write(StorageKey::AppConfig, "{}").unwrap();

        assert!(nested_dir.exists());
        assert!(store.exists(StorageKey::AppConfig));
    }

    #[test]
    fn test_write_then_read() {
        let (store, _temp) = test_store();
        store.write(StorageKey::EndpointOverride, "\"abc\"").unwrap();
        assert_eq!(
            store.read(StorageKey::EndpointOverride).unwrap().as_deref(),
            Some("\"abc\"")
        );
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let (store, temp) = test_store();
        store.write(StorageKey::AppConfig, "1").unwrap();
        store.write(StorageKey::AppConfig, "2").unwrap();

        assert_eq!(store.read(StorageKey::AppConfig).unwrap().as_deref(), Some("2"));
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let (store, _temp) = test_store();
        store.remove(StorageKey::WriteCredential).unwrap();
    }

    #[test]
    fn test_remove_existing() {
        let (store, _temp) = test_store();
        store.write(StorageKey::WriteCredential, "\"k\"").unwrap();
        store.remove(StorageKey::WriteCredential).unwrap();
        assert!(!store.exists(StorageKey::WriteCredential));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let store = FileStore::new(blocker);

        let err = store.write(StorageKey::WorkflowData, "[]").unwrap_err();
        assert!(err.to_string().contains("not-a-dir"));
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let (store, temp) = test_store();
        // A non-empty directory where the record belongs makes the rename fail.
        let target = store.path(StorageKey::WriteCredential);
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let err = store
            .write(StorageKey::WriteCredential, "\"secret\"")
            .unwrap_err();

        assert!(matches!(err, StorageError::Io(ref path, _) if path == &target));
        assert!(!temp.path().join(".admin_master_key.json.tmp").exists());
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_credential_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp) = test_store();
        store.write(StorageKey::WriteCredential, "\"secret\"").unwrap();
        let mode = fs::metadata(store.path(StorageKey::WriteCredential))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
