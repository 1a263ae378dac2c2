//! crates/couplequest_core/src/store.rs
//!
//! JSON persistence on top of a `KeyValueStore`. Reads fall back to a default
//! on any failure and writes never propagate errors: storage problems are
//! logged and the session carries on with what it has in memory.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

use crate::domain::UserIdentity;
use crate::ports::{KeyValueStore, PortError, PortResult};

/// Storage keys. The per-user keys are derived from the identity.
pub mod keys {
    use crate::domain::UserIdentity;

    pub const CURRENT_USER: &str = "currentUser";

    pub fn profile(user: &UserIdentity) -> String {
        format!("couple-profile-{}", user)
    }

    pub fn history(user: &UserIdentity) -> String {
        format!("date-history-{}", user)
    }

    pub fn favorites(user: &UserIdentity) -> String {
        format!("date-favorites-{}", user)
    }
}

#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KeyValueStore>,
}

impl Store {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Reads and decodes `key`, or returns `default` if it is absent or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key, error = %e, "Stored value is not valid JSON, using default.");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "Failed to read from storage, using default.");
                default
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(key, error = %e, "Failed to encode value for storage.");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &encoded) {
            error!(key, error = %e, "Failed to write to storage.");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            error!(key, error = %e, "Failed to remove key from storage.");
        }
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.load(keys::CURRENT_USER, None)
    }
}

//=========================================================================================
// In-Memory Backend
//=========================================================================================

/// A `KeyValueStore` that lives only as long as the process.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
