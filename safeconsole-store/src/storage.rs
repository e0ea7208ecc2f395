//! Durable key-value storage for session state.
//!
//! Values are plain strings: structured records are serialized by the
//! caller. Three backends are provided:
//!
//! - [`MemoryStorage`] - process-local, lost on exit
//! - [`FileStorage`] - one JSON object file, written atomically
//! - [`KeychainStorage`] - one keychain entry per key

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use safeconsole_fetch::{KeychainApi, SystemKeychain};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{load_json, remove_file_if_exists, save_json};

// ============================================================================
// Key-Value Store Trait
// ============================================================================

/// String key-value storage that survives restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. `Ok(None)` means the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes a value. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Backend Selection
// ============================================================================

/// Which storage backend holds the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON file in the config directory.
    #[default]
    File,
    /// System keychain.
    Keychain,
    /// Process memory only.
    Memory,
}

impl StorageBackend {
    /// Builds the backend. `path` is used by [`StorageBackend::File`].
    pub fn open(self, path: PathBuf) -> Arc<dyn KeyValueStore> {
        match self {
            Self::File => Arc::new(FileStorage::new(path)),
            Self::Keychain => Arc::new(KeychainStorage::system()),
            Self::Memory => Arc::new(MemoryStorage::new()),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Keychain => write!(f, "keychain"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

// ============================================================================
// Memory Storage
// ============================================================================

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything stored.
    pub async fn entries(&self) -> BTreeMap<String, String> {
        self.values.lock().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// File Storage
// ============================================================================

/// All keys in one JSON object file.
///
/// The file is re-read on every access so that separate processes see each
/// other's writes; writes go through [`save_json`] (atomic, owner-only).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Creates storage backed by `path`. The file is created on first write.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        load_json(&self.path).await
    }

    /// Reads the map for a read-modify-write cycle, starting over if the
    /// file is unreadable.
    async fn read_map_for_update(&self) -> BTreeMap<String, String> {
        self.read_map().await.unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Storage file unreadable, starting fresh");
            BTreeMap::new()
        })
    }
}

#[async_trait]
impl KeyValueStore for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map_for_update().await;
        map.insert(key.to_string(), value.to_string());
        save_json(&self.path, &map).await?;
        debug!(key = %key, path = %self.path.display(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map_for_update().await;
        if map.remove(key).is_none() && self.path.exists() {
            return Ok(());
        }
        if map.is_empty() {
            remove_file_if_exists(&self.path).await?;
        } else {
            save_json(&self.path, &map).await?;
        }
        debug!(key = %key, path = %self.path.display(), "Removed value");
        Ok(())
    }
}

// ============================================================================
// Keychain Storage
// ============================================================================

/// One keychain entry per key, under a fixed service name.
pub struct KeychainStorage {
    keychain: Arc<dyn KeychainApi>,
    service: String,
}

impl KeychainStorage {
    /// Storage in `keychain` under `service`.
    pub fn new(keychain: Arc<dyn KeychainApi>, service: impl Into<String>) -> Self {
        Self {
            keychain,
            service: service.into(),
        }
    }

    /// Storage in the system keychain under the session service.
    pub fn system() -> Self {
        Self::new(
            Arc::new(SystemKeychain::new()),
            safeconsole_fetch::host::keychain::services::SESSION,
        )
    }
}

impl std::fmt::Debug for KeychainStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainStorage")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for KeychainStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.keychain.get(&self.service, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.keychain.set(&self.service, key, value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        Ok(self.keychain.delete(&self.service, key).await?)
    }
}

// ============================================================================
// Tests
// ============================================================================
