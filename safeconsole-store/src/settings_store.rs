//! Client settings store.
//!
//! Manages the backend endpoint, quota defaults, classifier tuning, and
//! storage choice, persisted as JSON.

use safeconsole_core::{ClassifierConfig, DEFAULT_DAILY_LIMIT, DEFAULT_MONTHLY_LIMIT, UsageLimits};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};
use crate::storage::StorageBackend;

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default path of the rate-limit endpoint.
pub const DEFAULT_RATE_LIMIT_PATH: &str = "/api/rate-limit";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Settings Types
// ============================================================================

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL that relative API paths resolve against.
    pub api_base_url: String,

    /// Path of the rate-limit endpoint, relative to the base URL.
    pub rate_limit_path: String,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// Monthly ceiling used until the backend reports one.
    pub default_monthly_limit: u64,

    /// Daily ceiling used until the backend reports one.
    pub default_daily_limit: u64,

    /// Call classification tuning.
    pub classifier: ClassifierConfig,

    /// Where the session is persisted.
    pub storage_backend: StorageBackend,

    /// Log level.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            rate_limit_path: DEFAULT_RATE_LIMIT_PATH.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            default_monthly_limit: DEFAULT_MONTHLY_LIMIT,
            default_daily_limit: DEFAULT_DAILY_LIMIT,
            classifier: ClassifierConfig::default(),
            storage_backend: StorageBackend::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Ceilings a fresh meter starts with.
    pub fn usage_limits(&self) -> UsageLimits {
        UsageLimits {
            monthly: self.default_monthly_limit,
            daily: self.default_daily_limit,
        }
    }

    /// Full URL of the rate-limit endpoint.
    pub fn rate_limit_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.rate_limit_path.trim_start_matches('/')
        )
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Classifier configuration with the base URL's host counted as backend.
    ///
    /// Requests reach the meter with absolute URLs, so the configured
    /// backend has to be recognized by host.
    pub fn classifier_config(&self) -> ClassifierConfig {
        let mut config = self.classifier.clone();
        match Url::parse(&self.api_base_url) {
            Ok(url) => {
                if let Some(host) = url.host_str() {
                    let known = config
                        .backend_hosts
                        .iter()
                        .any(|h| h.eq_ignore_ascii_case(host));
                    if !known {
                        config.backend_hosts.push(host.to_string());
                    }
                }
            }
            Err(e) => warn!(url = %self.api_base_url, error = %e, "Invalid api_base_url"),
        }
        config
    }

    /// Checks values that would otherwise fail later.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for an unparseable base URL or a zero
    /// timeout.
    pub fn validate(&self) -> Result<(), StoreError> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| StoreError::Config(format!("api_base_url {}: {e}", self.api_base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StoreError::Config(format!(
                "api_base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(StoreError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store holding defaults, backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields defaults.
    pub async fn load(path: PathBuf) -> Self {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Self::with_settings(path, settings)
    }

    /// The backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings in memory. Call [`SettingsStore::save`] to persist.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
        debug!("Settings updated");
    }

    /// Puts every setting back to its default.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
