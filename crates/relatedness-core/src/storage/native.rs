// Native filesystem storage implementation.
//
// Keys map to paths relative to the base directory; nested keys such as
// "local/trigram/en/similarityNormalizer" create intermediate directories.

use super::{StorageBackend, StorageError};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Filesystem storage backend rooted at a base directory.
pub struct NativeStorage {
    base_path: PathBuf,
}

impl NativeStorage {
    /// Creates a NativeStorage rooted at `base_path`, creating it if needed.
    pub fn with_path(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)
            .map_err(|e| StorageError::IoError(format!("Failed to create directory: {}", e)))?;

        Ok(Self { base_path })
    }

    /// Returns the base path where data is stored.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a key to an absolute path.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Ensures parent directories exist for a given path.
    fn ensure_parent_dirs(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::IoError(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }
}

impl StorageBackend for NativeStorage {
    fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);

        self.ensure_parent_dirs(&path)?;

        std::fs::write(&path, data)
            .map_err(|e| StorageError::IoError(format!("Failed to write file: {}", e)))?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::IoError(format!("Failed to read file: {}", e))
            }
        })
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(key).is_file())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to delete file: {}",
                e
            ))),
        }
    }
}
