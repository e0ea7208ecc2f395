//! Store error types.

use safeconsole_fetch::{FetchError, KeychainError};
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Keychain-backed storage failed.
    #[error("Keychain error: {0}")]
    Keychain(#[from] KeychainError),

    /// Remote sync failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

