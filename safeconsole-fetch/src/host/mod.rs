//! Host APIs for SafeConsole.
//!
//! - [`keychain`] - Secure credential storage (system keychain)
//! - [`http`] - Network transport backed by reqwest

pub mod http;
pub mod keychain;

// Re-export key types
pub use http::ReqwestTransport;
pub use keychain::{KeychainApi, MemoryKeychain, SystemKeychain};
