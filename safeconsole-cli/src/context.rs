//! Composition root: builds the stores and the metered client from settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use safeconsole_core::CallClassifier;
use safeconsole_fetch::{HttpClient, ReqwestTransport, TransportSlot};
use safeconsole_store::{
    KeyValueStore, MemoryStorage, SessionStore, Settings, SettingsStore, UsageMeter,
    default_session_path, default_settings_path,
};
use tracing::debug;

use crate::Cli;

/// Settings file in effect: `--config` or the default.
pub fn settings_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(default_settings_path)
}

/// Loads the settings store for this invocation.
pub async fn load_settings(cli: &Cli) -> SettingsStore {
    SettingsStore::load(settings_path(cli)).await
}

/// Session file kept next to the settings file.
pub fn session_path(settings_path: &Path) -> PathBuf {
    settings_path
        .parent()
        .map_or_else(default_session_path, |dir| dir.join("session.json"))
}

/// Everything a command needs, wired together.
pub struct AppContext {
    /// Settings in effect.
    pub settings: Settings,
    /// Current session.
    pub session: SessionStore,
    /// Client whose calls go through the shared transport slot.
    pub client: HttpClient,
    /// Usage meter, not yet mounted.
    pub meter: Arc<UsageMeter>,
}

impl AppContext {
    /// Builds the context from settings and CLI flags.
    pub async fn build(cli: &Cli) -> Result<Self> {
        let path = settings_path(cli);
        let settings = SettingsStore::load(path.clone()).await.get().await;
        settings
            .validate()
            .with_context(|| format!("invalid settings in {}", path.display()))?;

        let storage: Arc<dyn KeyValueStore> = if cli.ephemeral {
            Arc::new(MemoryStorage::new())
        } else {
            settings.storage_backend.open(session_path(&path))
        };
        debug!(
            backend = %settings.storage_backend,
            ephemeral = cli.ephemeral,
            "Opening session storage"
        );
        let session = SessionStore::initialize(storage).await;

        let transport = ReqwestTransport::with_timeout(settings.request_timeout())
            .context("failed to build HTTP transport")?;
        let slot = Arc::new(TransportSlot::new(Arc::new(transport)));
        let client = HttpClient::new(slot).with_base_url(&settings.api_base_url)?;

        let classifier = CallClassifier::new(&settings.classifier_config());
        let meter = Arc::new(UsageMeter::new(settings.usage_limits(), classifier));

        Ok(Self {
            settings,
            session,
            client,
            meter,
        })
    }

    /// Seeds the meter from the backend's rate-limit endpoint.
    pub async fn sync_usage(&self) -> bool {
        self.meter
            .initialize(&self.client, &self.settings.rate_limit_url())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use safeconsole_core::{Role, UserIdentity};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_session_path_follows_settings_dir() {
        let path = session_path(Path::new("/tmp/sc/settings.json"));
        assert_eq!(path, PathBuf::from("/tmp/sc/session.json"));
    }

    #[tokio::test]
    async fn test_login_lands_next_to_settings_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = temp_dir.path().join("settings.json");
        let config = config.to_str().unwrap();

        let ctx = AppContext::build(&cli(&["safeconsole", "--config", config, "whoami"]))
            .await
            .unwrap();
        assert!(!ctx.session.is_authenticated());
        ctx.session
            .login(UserIdentity::new("u-1", "Alice", "a@example.com", Role::Admin), "t0k")
            .await;
        assert!(temp_dir.path().join("session.json").exists());

        let again = AppContext::build(&cli(&["safeconsole", "--config", config, "whoami"]))
            .await
            .unwrap();
        assert!(again.session.is_authenticated());

        let ephemeral = AppContext::build(&cli(&[
            "safeconsole",
            "--config",
            config,
            "--ephemeral",
            "whoami",
        ]))
        .await
        .unwrap();
        assert!(!ephemeral.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = temp_dir.path().join("settings.json");
        tokio::fs::write(&config, r#"{"api_base_url": "not a url"}"#)
            .await
            .unwrap();

        let result =
            AppContext::build(&cli(&["safeconsole", "--config", config.to_str().unwrap()])).await;
        assert!(result.is_err());
    }
}
