//! Durable key-value storage for client state.
//!
//! The cart is saved as a single JSON string under [`CART_STORAGE_KEY`] and
//! fully overwritten on every change. Two backends are provided:
//!
//! - [`SledStore`] - embedded `sled` database, survives restarts
//! - [`MemoryStore`] - process-local map for tests and throwaway runs

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Key under which the serialized cart is stored.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend I/O or database failure.
    #[error("Storage backend error: {0}")]
    Backend(#[from] sled::Error),

    /// Stored bytes are not valid UTF-8.
    #[error("Stored value for {key} is not valid UTF-8")]
    InvalidUtf8 { key: String },

    /// Shared state was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// String-keyed persistent storage.
///
/// Operations are synchronous. `set` overwrites any previous value.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// SledStore
// =============================================================================

/// Key-value store backed by an embedded `sled` database.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open a database that is deleted when dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` if the database cannot be created.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(bytes) = self.db.get(key)? else {
            return Ok(None);
        };
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| StorageError::InvalidUtf8 {
                key: key.to_string(),
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.insert(key, value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get_absent() {
        let store = MemoryStore::new();
        assert_eq!(store.get(CART_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set(CART_STORAGE_KEY, "[]").unwrap();
        store.set(CART_STORAGE_KEY, "[1]").unwrap();
        assert_eq!(store.get(CART_STORAGE_KEY).unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_sled_store_round_trip() {
        let store = SledStore::temporary().unwrap();
        assert_eq!(store.get(CART_STORAGE_KEY).unwrap(), None);
        store.set(CART_STORAGE_KEY, r#"[{"id":1}]"#).unwrap();
        assert_eq!(
            store.get(CART_STORAGE_KEY).unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
    }

    #[test]
    fn test_sled_store_invalid_utf8() {
        let store = SledStore::temporary().unwrap();
        store.db.insert("raw", &[0xff_u8, 0xfe][..]).unwrap();
        assert!(matches!(
            store.get("raw"),
            Err(StorageError::InvalidUtf8 { .. })
        ));
    }
}
