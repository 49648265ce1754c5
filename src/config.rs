//! Application-level configuration loading: storage backend choice and the
//! retry policy applied to concurrent updates and deletes.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::retry::RetryPolicy;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_PROVIDER_CONFIG_PATH";

/// Persistence backend the service connects to at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local store, lost on restart.
    #[default]
    Memory,
    /// MongoDB, configured through `MONGO_URI` / `MONGO_DB`.
    Mongo,
    /// CouchDB, configured through the `COUCH_*` variables.
    Couch,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    storage: StorageBackend,
    retry: RetryPolicy,
}

impl AppConfig {
    /// Build a configuration from explicit values.
    pub fn new(storage: StorageBackend, retry: RetryPolicy) -> Self {
        Self { storage, retry }
    }

    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        storage = ?app_config.storage,
                        max_attempts = app_config.retry.max_attempts(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON configuration format, filling absent keys with defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Storage backend selected for this run.
    pub fn storage(&self) -> StorageBackend {
        self.storage
    }

    /// Retry policy for version-conflicted writes.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    storage: StorageBackend,
    #[serde(default)]
    retry: Option<RawRetry>,
}

#[derive(Debug, Deserialize)]
struct RawRetry {
    max_attempts: Option<u32>,
    delay_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = RetryPolicy::default();
        let retry = match value.retry {
            Some(raw) => RetryPolicy::new(
                raw.max_attempts.unwrap_or(defaults.max_attempts()),
                raw.delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.delay()),
            ),
            None => defaults,
        };

        Self {
            storage: value.storage,
            retry,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.storage(), StorageBackend::Memory);
        assert_eq!(config.retry().max_attempts(), 3);
        assert_eq!(config.retry().delay(), Duration::from_secs(5));
    }

    #[test]
    fn partial_retry_section_keeps_other_defaults() {
        let config =
            AppConfig::from_json(r#"{"storage": "mongo", "retry": {"delay_ms": 250}}"#).unwrap();
        assert_eq!(config.storage(), StorageBackend::Mongo);
        assert_eq!(config.retry().max_attempts(), 3);
        assert_eq!(config.retry().delay(), Duration::from_millis(250));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(AppConfig::from_json(r#"{"storage": "oracle"}"#).is_err());
    }
}
