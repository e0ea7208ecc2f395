//! Persistence round-trip and edge case tests.
//!
//! Tests JSON file I/O, settings files on disk, and file-backed sessions.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::persistence::{load_json, load_json_or_default, save_json};
use crate::session_store::{SessionStore, TOKEN_KEY, USER_KEY};
use crate::settings_store::{LogLevel, Settings, SettingsStore};
use crate::storage::{FileStorage, KeyValueStore, StorageBackend};
use safeconsole_core::{AbsoluteUrlPolicy, Role, SubscriptionTier, UserIdentity};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("settings.json");

    save_json(&nested_path, &Settings::default()).await.unwrap();
    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/settings.json");

    let result: Result<Settings, _> = load_json(&file_path).await;
    assert!(result.is_err());

    let fallback: Settings = load_json_or_default(&file_path).await;
    assert_eq!(fallback, Settings::default());
}

#[tokio::test]
async fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("atomic.json");

    save_json(&file_path, &Settings::default()).await.unwrap();

    assert!(!file_path.with_extension("json.tmp").exists());
    assert!(file_path.exists());
}

// ============================================================================
// Settings Files
// ============================================================================

#[tokio::test]
async fn test_settings_full_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("settings.json");

    let mut settings = Settings {
        api_base_url: "https://safety.example.com".to_string(),
        request_timeout_secs: 5,
        default_monthly_limit: 250,
        storage_backend: StorageBackend::Keychain,
        log_level: LogLevel::Debug,
        ..Settings::default()
    };
    settings.classifier.absolute_urls = AbsoluteUrlPolicy::AnyHttp;
    settings.classifier.backend_hosts = vec!["api.safety.example.com".to_string()];

    save_json(&file_path, &settings).await.unwrap();
    let loaded: Settings = load_json(&file_path).await.unwrap();
    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn test_load_json_with_unknown_fields() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("extra_fields.json");

    let json = r#"{
        "storage_backend": "memory",
        "classifier": {"api_prefix": "/v2/"},
        "theme": "dark",
        "nested_unknown": {"key": "value"}
    }"#;
    tokio::fs::write(&file_path, json).await.unwrap();

    let loaded: Settings = load_json(&file_path).await.unwrap();
    assert_eq!(loaded.storage_backend, StorageBackend::Memory);
    assert_eq!(loaded.classifier.api_prefix, "/v2/");
    assert_eq!(loaded.classifier.local_dev_hosts.len(), 2);
}

#[tokio::test]
async fn test_settings_store_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("settings.json");

    let store = SettingsStore::load(file_path.clone()).await;
    assert_eq!(store.get().await, Settings::default());

    store.update(|s| s.default_daily_limit = 7).await;
    store.save().await.unwrap();

    let reloaded = SettingsStore::load(file_path).await;
    assert_eq!(reloaded.get().await.default_daily_limit, 7);
}

#[tokio::test]
async fn test_corrupt_settings_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("settings.json");
    tokio::fs::write(&file_path, "{ broken").await.unwrap();

    let store = SettingsStore::load(file_path).await;
    assert_eq!(store.get().await, Settings::default());
}

// ============================================================================
// File-backed Sessions
// ============================================================================

#[tokio::test]
async fn test_session_survives_restart_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    let user = UserIdentity::new("u-7", "Dana", "dana@example.com", Role::Auditor)
        .with_organization("Plant 4")
        .with_tier(SubscriptionTier::Professional);

    let store = SessionStore::initialize(Arc::new(FileStorage::new(path.clone()))).await;
    store.login(user.clone(), "t0k").await;

    let restored = SessionStore::initialize(Arc::new(FileStorage::new(path.clone()))).await;
    assert!(restored.is_authenticated());
    assert_eq!(restored.user(), Some(user));

    restored.logout().await;
    assert!(!path.exists());
}

#[tokio::test]
async fn test_corrupt_session_file_is_unauthenticated() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    tokio::fs::write(&path, "\u{0}\u{1}garbage").await.unwrap();

    let store = SessionStore::initialize(Arc::new(FileStorage::new(path))).await;
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_unicode_identity_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    let storage = Arc::new(FileStorage::new(path));

    let user = UserIdentity::new("u-8", "José Müller 日本", "jm@example.com", Role::Employee);
    SessionStore::initialize(storage.clone())
        .await
        .login(user.clone(), "tok")
        .await;

    let raw = storage.get(USER_KEY).await.unwrap().unwrap();
    let stored: UserIdentity = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, user);
    assert_eq!(storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok"));
}
