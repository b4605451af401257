// Key-value storage backends for the task list

use crate::error::StorageError;
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Synchronous key-value store the task list is persisted into
pub trait Storage {
    /// Read the value stored under `key`, `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Keys are 1-64 chars of ASCII alphanumerics, `_` or `-`
///
/// File-backed keys become file names, so anything that could leave the
/// storage directory is rejected.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.len() > 64 || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// In-process storage, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail with [`StorageError::Unavailable`]
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make every subsequent `get` fail with [`StorageError::Unavailable`]
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Seed a raw value, bypassing the write-failure switch
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Unavailable);
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable);
        }
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per key
///
/// Writers hold an exclusive lock on `<key>.lock` and replace the value file
/// atomically via a temp file and rename.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open or create storage rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        info!(path = ?base_path, "Opened file storage");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file holding `key`
    pub fn value_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.lock", key))
    }

    fn open_lock(&self, key: &str) -> Result<File, StorageError> {
        let path = self.lock_path(key);
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| StorageError::Lock {
                path: path.display().to_string(),
                source,
            })
    }

    fn write_value(tmp_path: &Path, path: &Path, value: &str) -> Result<(), StorageError> {
        let mut file = File::create(tmp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;

        let path = self.value_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.open_lock(key)?;
        lock.lock_shared().map_err(|source| StorageError::Lock {
            path: self.lock_path(key).display().to_string(),
            source,
        })?;

        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(file = ?path, bytes = content.len(), "Read stored value");
                Ok(Some(content))
            }
            // Removed between the exists() check and the read
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
        // Lock is released when `lock` is dropped
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        let lock = self.open_lock(key)?;
        lock.lock_exclusive().map_err(|source| StorageError::Lock {
            path: self.lock_path(key).display().to_string(),
            source,
        })?;

        let path = self.value_path(key);
        let tmp_path = self.base_path.join(format!("{}.json.tmp", key));

        if let Err(e) = Self::write_value(&tmp_path, &path, value) {
            match fs::remove_file(&tmp_path) {
                Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                    warn!(file = ?tmp_path, error = ?cleanup, "Failed to remove temp file");
                }
                _ => {}
            }
            return Err(e);
        }

        debug!(file = ?path, bytes = value.len(), "Wrote stored value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_get_set() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("todos").unwrap(), None);

        storage.set("todos", "[]").unwrap();
        assert_eq!(storage.get("todos").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_storage_fail_writes() {
        let mut storage = MemoryStorage::new();
        storage.set("todos", "[1]").unwrap();
        storage.set_fail_writes(true);

        assert!(matches!(storage.set("todos", "[2]"), Err(StorageError::Unavailable)));
        assert_eq!(storage.get("todos").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_memory_storage_fail_reads_and_write_count() {
        let mut storage = MemoryStorage::new();
        storage.set("todos", "[]").unwrap();
        storage.set_fail_reads(true);

        assert!(matches!(storage.get("todos"), Err(StorageError::Unavailable)));
        storage.set("todos", "[1]").unwrap();
        assert_eq!(storage.write_count(), 2);

        storage.set_fail_reads(false);
        assert_eq!(storage.get("todos").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("todos").is_ok());
        assert!(validate_key("work_list-2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../x").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_file_storage_failed_write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        // A directory in place of the value file makes the final rename fail
        fs::create_dir(temp.path().join("todos.json")).unwrap();
        fs::write(temp.path().join("todos.json").join("inner"), "x").unwrap();

        assert!(storage.set("todos", "[]").is_err());
        assert!(!temp.path().join("todos.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("data");

        let storage = FileStorage::open(&dir).unwrap();
        assert!(dir.exists());
        assert_eq!(storage.base_path(), dir.as_path());
    }

    #[test]
    fn test_file_storage_missing_key() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get("todos").unwrap(), None);
    }

    #[test]
    fn test_file_storage_roundtrip_and_overwrite() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        storage.set("todos", "first").unwrap();
        storage.set("todos", "second").unwrap();

        assert_eq!(storage.get("todos").unwrap().as_deref(), Some("second"));
        assert!(temp.path().join("todos.json").exists());
        assert!(!temp.path().join("todos.json.tmp").exists());

        // A fresh handle on the same directory sees the value
        let reopened = FileStorage::open(temp.path()).unwrap();
        assert_eq!(reopened.get("todos").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_file_storage_rejects_bad_keys() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        assert!(matches!(storage.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(storage.set(&"a".repeat(65), "x"), Err(StorageError::InvalidKey(_))));
        assert!(storage.set("valid_key-1", "x").is_ok());
    }
}
