use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::KeyValueStore;
use crate::error::StoreError;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Access and refresh token, always stored and cleared together.
///
/// Serializes with the field names the auth endpoints use.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Never print token values.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

type Listener = Box<dyn Fn(Option<&str>) + Send + Sync>;

/// Shared handle to the persisted session tokens.
///
/// Clones share the backend and the change listeners, so a rotation by one
/// holder is seen by every other.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    listeners: Arc<RwLock<Vec<Listener>>>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Calls `listener` with the new access token after every save or clear.
    /// Listeners run on the writer's thread and must not write to the store.
    pub fn on_change<F>(&self, listener: F) -> Result<(), StoreError>
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .push(Box::new(listener));
        Ok(())
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(super::MemoryStore::new()))
    }

    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.backend.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.backend.get(REFRESH_TOKEN_KEY)
    }

    /// Both tokens, or `None` unless both are present.
    pub fn tokens(&self) -> Result<Option<TokenPair>, StoreError> {
        match (self.access_token()?, self.refresh_token()?) {
            (Some(access), Some(refresh)) => Ok(Some(TokenPair::new(access, refresh))),
            _ => Ok(None),
        }
    }

    pub fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        self.backend.set_many(&[
            (ACCESS_TOKEN_KEY, pair.access_token.as_str()),
            (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
        ])?;
        debug!("Stored new token pair");
        self.notify(Some(&pair.access_token))
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])?;
        debug!("Cleared token pair");
        self.notify(None)
    }

    fn notify(&self, access_token: Option<&str>) -> Result<(), StoreError> {
        let listeners = self.listeners.read().map_err(|_| StoreError::Poisoned)?;
        for listener in listeners.iter() {
            listener(access_token);
        }
        Ok(())
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
