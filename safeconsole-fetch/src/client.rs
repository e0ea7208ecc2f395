//! HTTP client handed to every caller.
//!
//! The client only builds requests; sending goes through whatever transport
//! its [`TransportSlot`] holds at call time, so a wrapper installed in the
//! slot sees every call made through any clone of the client.

use std::sync::Arc;

use reqwest::{Method, Request, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, HttpError};
use crate::slot::TransportSlot;

// ============================================================================
// HTTP Client
// ============================================================================

/// Request builder bound to a shared transport slot.
#[derive(Debug, Clone)]
pub struct HttpClient {
    slot: Arc<TransportSlot>,
    base_url: Option<Url>,
}

impl HttpClient {
    /// Creates a client sending through `slot`.
    pub fn new(slot: Arc<TransportSlot>) -> Self {
        Self {
            slot,
            base_url: None,
        }
    }

    /// Resolves relative URLs (such as `/api/incidents`) against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] if `base` is not an absolute URL.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, HttpError> {
        let parsed = Url::parse(base).map_err(|e| HttpError::InvalidUrl(format!("{base}: {e}")))?;
        self.base_url = Some(parsed);
        Ok(self)
    }

    /// The slot this client sends through.
    pub fn slot(&self) -> &Arc<TransportSlot> {
        &self.slot
    }

    /// The base URL for relative paths, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Turns `url` into an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] for relative URLs without a base.
    pub fn resolve(&self, url: &str) -> Result<Url, HttpError> {
        match Url::parse(url) {
            Ok(parsed) => Ok(parsed),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    HttpError::InvalidUrl(format!("{url}: relative URL without a base URL"))
                })?;
                base.join(url)
                    .map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))
            }
            Err(e) => Err(HttpError::InvalidUrl(format!("{url}: {e}"))),
        }
    }

    /// Builds a bare request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be resolved.
    pub fn request(&self, method: Method, url: &str) -> Result<Request, HttpError> {
        Ok(Request::new(method, self.resolve(url)?))
    }

    /// Sends a prepared request through the current transport.
    ///
    /// # Errors
    ///
    /// Returns whatever the transport returns.
    pub async fn send(&self, request: Request) -> Result<Response, HttpError> {
        debug!(method = %request.method(), url = %request.url(), "Dispatching request");
        let transport = self.slot.current();
        transport.execute(request).await
    }

    /// Performs a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid URL or transport failure.
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.send(self.request(Method::GET, url)?).await
    }

    /// GETs `url` and decodes a JSON body, treating non-2xx as an error.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::AuthenticationFailed`] on 401,
    /// [`FetchError::Status`] on any other non-success status, and
    /// [`FetchError::Json`] on a malformed body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::AuthenticationFailed(
                "Invalid or expired credentials".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response.text().await.map_err(HttpError::from)?;
        Ok(serde_json::from_str(&body)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
