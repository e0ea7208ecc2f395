//! Default transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use tracing::{debug, instrument};

use crate::error::HttpError;
use crate::transport::HttpTransport;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for `SafeConsole`.
const USER_AGENT: &str = concat!("SafeConsole/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Reqwest Transport
// ============================================================================

/// Sends requests over the network with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom timeout.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { inner: client })
    }

    /// Returns the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        debug!("Sending request");
        let response = self.inner.execute(request).await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_execute_passes_error_status_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/incidents"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let url = format!("{}/api/incidents", server.uri());
        let request = Request::new(reqwest::Method::GET, url.parse().unwrap());
        let response = transport.execute(request).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("7")
        );
    }
}
