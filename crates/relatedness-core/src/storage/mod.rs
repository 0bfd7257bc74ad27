//! Key-value storage backends for persisting trained normalizers.
//!
//! # Storage Abstractions
//!
//! [`StorageBackend`] is a simple key-value blob store. Keys are `/`-separated
//! paths, so a backend naturally scopes data by directory: a normalizer pair
//! bound to `local/trigram/en` lives under `local/trigram/en/similarityNormalizer`
//! and `local/trigram/en/mostSimilarNormalizer`.
//!
//! # Implementations
//!
//! - [`InMemoryStorage`] - HashMap-backed storage for tests
//! - [`NativeStorage`] - Files under a base directory

mod native;

pub use native::NativeStorage;

pub use crate::error::StorageError;

use std::collections::HashMap;
use std::sync::RwLock;

/// Storage backend abstraction for normalizer persistence.
///
/// Writes are never issued concurrently with training passes, but backends
/// are still `Send + Sync` so a trainer can be moved across threads.
pub trait StorageBackend: Send + Sync {
    /// Save binary data to storage with a key.
    #[must_use = "Storage save failures should be handled"]
    fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Load binary data from storage by key.
    #[must_use = "Storage load failures should be handled"]
    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check if a key exists in storage.
    #[must_use = "Storage check failures should be handled"]
    fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete data by key. Deleting a missing key is not an error.
    #[must_use = "Storage delete failures should be handled"]
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Joins a directory scope and a name into a storage key.
pub fn scoped_key(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// In-memory storage backend.
/// Useful for testing or when persistence is disabled.
#[derive(Default)]
pub struct InMemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStorage {
    fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| StorageError::IoError(format!("Lock poisoned: {}", e)))?;
        blobs.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| StorageError::IoError(format!("Lock poisoned: {}", e)))?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| StorageError::IoError(format!("Lock poisoned: {}", e)))?;
        Ok(blobs.contains_key(key))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| StorageError::IoError(format!("Lock poisoned: {}", e)))?;
        blobs.remove(key);
        Ok(())
    }
}
