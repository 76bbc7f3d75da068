//! Persistent key-value storage for the session tokens.
//!
//! The [`KeyValueStore`] trait only offers batch writes so that callers
//! can update related keys together. [`TokenStore`] is the single writer
//! of the `accessToken` / `refreshToken` pair.

mod file;
mod tokens;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;

pub use file::FileStore;
pub use tokens::{TokenPair, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes all entries as one update.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError>;

    /// Removes all keys as one update. Missing keys are ignored.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// Process-local store, lost on exit. Used by tests and embedders that
/// manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in pairs {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
