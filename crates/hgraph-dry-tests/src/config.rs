// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use hgraph_core::config::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Clones share state. Loads and saves are counted (attempts, not successes)
/// and either direction can be told to fail.
///
/// # Example
///
/// ```
/// use hgraph_dry_tests::InMemoryConfigStore;
/// use hgraph_core::config::ConfigService;
/// use hgraph_core::EngineConfig;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// EngineConfig::default().save(&service).unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert!(store.contains_key("engine"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one raw blob under `key`.
    pub fn with_raw(key: &str, data: &[u8]) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), data.to_vec());
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Configure the store to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Number of `load_raw` calls, including failed ones.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Number of `save_raw` calls, including failed ones.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hgraph_core::config::ConfigService;
    use hgraph_core::{ClockConfig, EngineConfig, RetryPolicy};

    #[test]
    fn engine_config_round_trip() {
        let store = InMemoryConfigStore::new();
        let service = ConfigService::new(store.clone());
        let cfg = EngineConfig {
            retry: RetryPolicy::no_retry(),
            clock: ClockConfig::Fixed(9),
        };
        cfg.save(&service).unwrap();
        assert_eq!(EngineConfig::load_or_default(&service).unwrap(), cfg);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn failing_load_surfaces_error() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_load(true);
        let service = ConfigService::new(store);
        assert!(matches!(
            EngineConfig::load_or_default(&service),
            Err(ConfigError::Other(_))
        ));
    }

    #[test]
    fn failing_save_stores_nothing() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        let service = ConfigService::new(store.clone());
        assert!(EngineConfig::default().save(&service).is_err());
        assert_eq!(store.save_count(), 1);
        assert!(!store.contains_key("engine"));
    }

    #[test]
    fn malformed_json_is_a_serde_error() {
        let store = InMemoryConfigStore::with_raw("engine", b"{not json");
        let service = ConfigService::new(store);
        assert!(matches!(
            EngineConfig::load_or_default(&service),
            Err(ConfigError::Serde(_))
        ));
    }

    #[test]
    fn clones_share_state() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.save_raw("k", br#"{"clock":"system"}"#).unwrap();
        assert_eq!(b.load_raw("k").unwrap(), br#"{"clock":"system"}"#);
        assert_eq!(b.save_count(), 1);
        let _ = serde_json::from_slice::<EngineConfig>(&b.load_raw("k").unwrap()).unwrap();
    }
}
