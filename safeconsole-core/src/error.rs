//! Core error types for `SafeConsole`.

use thiserror::Error;

/// Core error type for `SafeConsole` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid data from storage, an API response or user input.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors raised while classifying an outgoing call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// The request carried no URL text.
    #[error("empty request URL")]
    EmptyUrl,

    /// An absolute URL could not be parsed.
    #[error("malformed URL {url}: {reason}")]
    MalformedUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },
}
