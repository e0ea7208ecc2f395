// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # SafeConsole Store
//!
//! State management for the SafeConsole client.
//!
//! This crate provides:
//!
//! - **SessionStore**: Current user and token, mirrored to durable storage
//! - **UsageMeter**: Quota counters fed by intercepted backend calls
//! - **SettingsStore**: Client settings with persistence
//! - **Storage**: Key-value backends (file, keychain, memory)
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use safeconsole_store::{SessionStore, SettingsStore, UsageMeter};
//!
//! let settings = SettingsStore::load_default().await.get().await;
//! let session = SessionStore::initialize(settings.storage_backend.open(path)).await;
//!
//! let meter = Arc::new(UsageMeter::new(settings.usage_limits(), classifier));
//! meter.initialize(&client, &settings.rate_limit_url()).await;
//! let _guard = meter.mount(client.slot());
//!
//! // Every call through `client` is now counted
//! client.get("/api/incidents").await?;
//! println!("{} calls left", meter.remaining());
//! ```

pub mod error;
pub mod persistence;
pub mod session_store;
pub mod settings_store;
pub mod storage;
pub mod usage_meter;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_session_path, default_settings_path, load_json,
    load_json_or_default, save_json,
};
pub use session_store::{SessionStore, TOKEN_KEY, USER_KEY};
pub use settings_store::{LogLevel, Settings, SettingsStore};
pub use storage::{FileStorage, KeyValueStore, KeychainStorage, MemoryStorage, StorageBackend};
pub use usage_meter::UsageMeter;

#[cfg(test)]
mod persistence_tests;
