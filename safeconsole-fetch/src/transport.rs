//! The network primitive and its observation decorator.
//!
//! Every outgoing call in `SafeConsole` goes through an [`HttpTransport`].
//! Cross-cutting concerns such as usage accounting are added by wrapping a
//! transport in a decorator rather than by patching callers.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};
use tracing::trace;

use crate::error::HttpError;

// ============================================================================
// Transport Trait
// ============================================================================

/// Executes one HTTP request.
///
/// Implementations must be behavior-preserving proxies when they wrap
/// another transport: same response, same error.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the response.
    async fn execute(&self, request: Request) -> Result<Response, HttpError>;
}

// ============================================================================
// Observer
// ============================================================================

/// Sees every request before it is dispatched.
///
/// Observers run inline and synchronously, so whatever they record follows
/// the order in which calls are issued. They cannot fail or alter the
/// request; any internal error must be handled by the observer itself.
pub trait RequestObserver: Send + Sync {
    /// Called once per request, before the inner transport runs.
    fn on_request(&self, request: &Request);
}

/// Transport decorator that notifies an observer, then forwards the call
/// unmodified.
pub struct ObservedTransport {
    inner: Arc<dyn HttpTransport>,
    observer: Arc<dyn RequestObserver>,
}

impl ObservedTransport {
    /// Wraps `inner` so that `observer` sees every request.
    pub fn new(inner: Arc<dyn HttpTransport>, observer: Arc<dyn RequestObserver>) -> Self {
        Self { inner, observer }
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &Arc<dyn HttpTransport> {
        &self.inner
    }
}

impl std::fmt::Debug for ObservedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpTransport for ObservedTransport {
    async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        trace!(method = %request.method(), url = %request.url(), "Observing request");
        self.observer.on_request(&request);
        self.inner.execute(request).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Transport that always fails with a recognizable error.
    struct RefusingTransport;

    #[async_trait]
    impl HttpTransport for RefusingTransport {
        async fn execute(&self, request: Request) -> Result<Response, HttpError> {
            Err(HttpError::Unavailable(request.url().to_string()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl RequestObserver for Recorder {
        fn on_request(&self, request: &Request) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{} {}", request.method(), request.url()));
        }
    }

    fn request(url: &str) -> Request {
        Request::new(reqwest::Method::GET, url.parse().unwrap())
    }

    #[tokio::test]
    async fn test_observer_runs_before_forwarding() {
        let recorder = Arc::new(Recorder::default());
        let transport = ObservedTransport::new(Arc::new(RefusingTransport), recorder.clone());

        let result = transport.execute(request("http://localhost:8000/api/ppe")).await;

        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            ["GET http://localhost:8000/api/ppe"]
        );
        match result {
            Err(HttpError::Unavailable(url)) => assert_eq!(url, "http://localhost:8000/api/ppe"),
            other => panic!("expected the inner error unchanged, got {other:?}"),
        }
    }
}
