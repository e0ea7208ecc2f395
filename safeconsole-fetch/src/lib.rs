// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # SafeConsole Fetch
//!
//! HTTP plumbing and host APIs for the SafeConsole client.
//!
//! ## Transport
//!
//! - [`transport::HttpTransport`] - The network primitive every call uses
//! - [`transport::ObservedTransport`] - Decorator that shows each request
//!   to a [`transport::RequestObserver`] before forwarding it
//! - [`slot::TransportSlot`] - The shared, swappable transport, with a
//!   [`slot::TransportGuard`] that unlinks its wrapper on drop
//! - [`client::HttpClient`] - Request builder bound to a slot
//!
//! ## Host APIs
//!
//! - [`host::http`] - Reqwest-backed transport
//! - [`host::keychain`] - Secure credential storage (system keychain)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use safeconsole_fetch::{HttpClient, ReqwestTransport, TransportSlot};
//!
//! let slot = Arc::new(TransportSlot::new(Arc::new(ReqwestTransport::new()?)));
//! let client = HttpClient::new(Arc::clone(&slot)).with_base_url("http://localhost:8000")?;
//!
//! // Wrap the slot; every clone of `client` is now observed
//! let guard = slot.wrap(|inner| Arc::new(ObservedTransport::new(inner, observer)));
//! client.get("/api/incidents").await?;
//! drop(guard); // original transport is back
//! ```

// Core modules
pub mod client;
pub mod error;
pub mod host;
pub mod slot;
pub mod transport;

// Re-export key types at crate root

// Errors
pub use error::{FetchError, HttpError, KeychainError};

// Host APIs
pub use host::{
    http::ReqwestTransport,
    keychain::{KeychainApi, MemoryKeychain, SystemKeychain},
};

// Transport & client
pub use client::HttpClient;
pub use slot::{TransportGuard, TransportSlot};
pub use transport::{HttpTransport, ObservedTransport, RequestObserver};
