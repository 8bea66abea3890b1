// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for OpenOTDR tools.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values as JSON and delegates storage to a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load `key`, falling back to `T::default()` when it is missing or
    /// cannot be read.
    pub fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(err) => {
                debug!(key, error = %err, "config unreadable; using defaults");
                T::default()
            }
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

/// In-memory [`ConfigStore`], used when a tool runs without a config
/// directory and by tests.
///
/// Clones share the same storage.
///
/// ```
/// use otdr_app_core::config::{ConfigService, MemoryConfigStore};
///
/// let store = MemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
/// service.save("prefs", &serde_json::json!({"stride": 4})).unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert!(store.contains_key("prefs"));
/// ```
#[derive(Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<MemoryConfigStoreInner>>,
}

#[derive(Default)]
struct MemoryConfigStoreInner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl MemoryConfigStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given key-value pairs.
    pub fn with_data(data: HashMap<String, Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryConfigStoreInner {
                data,
                ..Default::default()
            })),
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut MemoryConfigStoreInner) -> R) -> R {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut inner)
    }

    /// Make subsequent loads fail with [`ConfigError::Other`].
    pub fn set_fail_on_load(&self, fail: bool) {
        self.with_inner(|inner| inner.fail_on_load = fail);
    }

    /// Make subsequent saves fail with [`ConfigError::Other`].
    pub fn set_fail_on_save(&self, fail: bool) {
        self.with_inner(|inner| inner.fail_on_save = fail);
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.with_inner(|inner| inner.load_count)
    }

    /// Number of `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.with_inner(|inner| inner.save_count)
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.with_inner(|inner| inner.data.contains_key(key))
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.with_inner(|inner| {
            inner.load_count += 1;
            if inner.fail_on_load {
                return Err(ConfigError::Other("simulated load failure".into()));
            }
            inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
        })
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.with_inner(|inner| {
            inner.save_count += 1;
            if inner.fail_on_save {
                return Err(ConfigError::Other("simulated save failure".into()));
            }
            inner.data.insert(key.to_string(), data.to_vec());
            Ok(())
        })
    }
}
