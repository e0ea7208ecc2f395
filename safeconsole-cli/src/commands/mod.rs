//! CLI command implementations.

pub mod classify;
pub mod config;
pub mod request;
pub mod session;
pub mod usage;
