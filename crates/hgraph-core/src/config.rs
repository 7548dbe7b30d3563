// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine configuration and the config storage port.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Key under which [`EngineConfig`] is stored.
pub const ENGINE_CONFIG_KEY: &str = "engine";

/// Where engine settings live between runs: opaque JSON blobs by key.
///
/// The filesystem store and the in-memory test store implement this.
pub trait ConfigStore {
    /// Reads the blob stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the blob stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure reading or writing engine settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No blob under the requested key.
    #[error("[HG_CONFIG_NOT_FOUND] no stored settings")]
    NotFound,
    /// The store could not be read or written.
    #[error("[HG_CONFIG_IO] {0}")]
    Io(#[from] std::io::Error),
    /// A stored blob is not valid JSON for the requested type.
    #[error("[HG_CONFIG_DECODE] {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure, such as an unusable key or missing directory.
    #[error("[HG_CONFIG] {0}")]
    Other(String),
}

/// JSON codec in front of a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Decodes the value under `key`; a missing or blank blob is `Ok(None)`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => {
                debug!(key, "no stored settings");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(key, "stored settings are blank");
            return Ok(None);
        }
        debug!(key, bytes = bytes.len(), "decoding stored settings");
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Encodes `value` as pretty JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        debug!(key, bytes = data.len(), "saving settings");
        self.store.save_raw(key, &data)
    }
}

/// How many times a transaction tries to reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total commit attempts per transaction (values below 1 count as 1).
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Source of default timestamps for `add` calls without an explicit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClockConfig {
    /// Seconds since the Unix epoch.
    #[default]
    System,
    /// Always the given value.
    Fixed(i64),
}

impl ClockConfig {
    /// Current timestamp according to this clock.
    pub fn now(&self) -> i64 {
        match self {
            Self::System => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX)),
            Self::Fixed(ts) => *ts,
        }
    }
}

/// Tunables for a [`Hypergraph`](crate::Hypergraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend commit retry policy.
    pub retry: RetryPolicy,
    /// Default timestamp source.
    pub clock: ClockConfig,
}

impl EngineConfig {
    /// Loads the engine config from `service`, falling back to defaults when
    /// the key is absent.
    pub fn load_or_default<S: ConfigStore>(service: &ConfigService<S>) -> Result<Self, ConfigError> {
        Ok(service.load(ENGINE_CONFIG_KEY)?.unwrap_or_default())
    }

    /// Persists this config under [`ENGINE_CONFIG_KEY`].
    pub fn save<S: ConfigStore>(&self, service: &ConfigService<S>) -> Result<(), ConfigError> {
        service.save(ENGINE_CONFIG_KEY, self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStore(RefCell<HashMap<String, Vec<u8>>>);

    impl ConfigStore for MapStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.0.borrow().get(key).cloned().ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.0.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_key_yields_defaults() {
        let service = ConfigService::new(MapStore::default());
        let cfg = EngineConfig::load_or_default(&service).unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[test]
    fn round_trip_through_service() {
        let service = ConfigService::new(MapStore::default());
        let cfg = EngineConfig {
            retry: RetryPolicy {
                max_attempts: 5,
                backoff_ms: 20,
            },
            clock: ClockConfig::Fixed(123456789),
        };
        cfg.save(&service).unwrap();
        assert_eq!(EngineConfig::load_or_default(&service).unwrap(), cfg);
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let store = MapStore::default();
        store
            .save_raw(ENGINE_CONFIG_KEY, br#"{"retry":{"max_attempts":7}}"#)
            .unwrap();
        let cfg = EngineConfig::load_or_default(&ConfigService::new(store)).unwrap();
        assert_eq!(cfg.retry.max_attempts, 7);
        assert_eq!(cfg.retry.backoff_ms, 0);
        assert_eq!(cfg.clock, ClockConfig::System);
    }

    #[test]
    fn blank_blob_counts_as_absent() {
        let store = MapStore::default();
        store.save_raw(ENGINE_CONFIG_KEY, b" \n\t").unwrap();
        let service = ConfigService::new(store);
        assert_eq!(
            EngineConfig::load_or_default(&service).unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn decode_errors_carry_their_tag() {
        let store = MapStore::default();
        store.save_raw(ENGINE_CONFIG_KEY, b"{\"retry\": 3}").unwrap();
        let err = EngineConfig::load_or_default(&ConfigService::new(store)).unwrap_err();
        assert!(matches!(err, ConfigError::Serde(_)));
        assert!(err.to_string().starts_with("[HG_CONFIG_DECODE]"));
        assert_eq!(
            ConfigError::NotFound.to_string(),
            "[HG_CONFIG_NOT_FOUND] no stored settings"
        );
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff_ms: 0,
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(ClockConfig::Fixed(42).now(), 42);
        assert!(ClockConfig::System.now() > 0);
    }
}
