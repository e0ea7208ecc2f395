//! Shared, swappable transport.
//!
//! A [`TransportSlot`] is the one network primitive the whole application
//! shares. Components that want to observe all traffic install a wrapper
//! with [`TransportSlot::wrap`] and get a [`TransportGuard`] back; dropping
//! the guard unlinks that wrapper and nothing else.
//!
//! Wrappers form a chain over a base transport. Removing one from the middle
//! rebuilds the wrappers above it around whatever is now beneath them.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::transport::HttpTransport;

/// Builds a wrapper around the transport beneath it.
type WrapFn = dyn Fn(Arc<dyn HttpTransport>) -> Arc<dyn HttpTransport> + Send + Sync;

struct Layer {
    id: u64,
    wrap: Arc<WrapFn>,
    built: Arc<dyn HttpTransport>,
}

struct Chain {
    base: Arc<dyn HttpTransport>,
    layers: Vec<Layer>,
    next_id: u64,
}

impl Chain {
    fn top(&self) -> Arc<dyn HttpTransport> {
        self.layers
            .last()
            .map_or_else(|| Arc::clone(&self.base), |layer| Arc::clone(&layer.built))
    }

    /// Re-applies every layer from `from` upwards.
    fn rebuild_from(&mut self, from: usize) {
        for i in from..self.layers.len() {
            let below = if i == 0 {
                Arc::clone(&self.base)
            } else {
                Arc::clone(&self.layers[i - 1].built)
            };
            self.layers[i].built = (self.layers[i].wrap)(below);
        }
    }
}

// ============================================================================
// Transport Slot
// ============================================================================

/// Holds the transport currently used by every [`HttpClient`](crate::HttpClient).
pub struct TransportSlot {
    chain: RwLock<Chain>,
}

impl TransportSlot {
    /// Creates a slot holding `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            chain: RwLock::new(Chain {
                base: transport,
                layers: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Returns the transport in use right now.
    pub fn current(&self) -> Arc<dyn HttpTransport> {
        self.chain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .top()
    }

    /// Number of wrappers installed.
    pub fn depth(&self) -> usize {
        self.chain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .layers
            .len()
    }

    /// Swaps the base transport and returns the previous one.
    ///
    /// Installed wrappers stay in place around the new base.
    pub fn replace(&self, transport: Arc<dyn HttpTransport>) -> Arc<dyn HttpTransport> {
        let mut chain = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut chain.base, transport);
        chain.rebuild_from(0);
        previous
    }

    /// Installs the transport produced by `wrap` around the current one.
    ///
    /// `wrap` runs again whenever a wrapper beneath this one is removed, so
    /// it must be cheap and must not touch the slot. It runs under the
    /// slot's write lock.
    pub fn wrap<F>(self: &Arc<Self>, wrap: F) -> TransportGuard
    where
        F: Fn(Arc<dyn HttpTransport>) -> Arc<dyn HttpTransport> + Send + Sync + 'static,
    {
        let mut chain = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        let id = chain.next_id;
        chain.next_id += 1;

        let wrap: Arc<WrapFn> = Arc::new(wrap);
        let built = wrap(chain.top());
        chain.layers.push(Layer { id, wrap, built });
        debug!(id, depth = chain.layers.len(), "Transport wrapper installed");

        TransportGuard {
            slot: Arc::clone(self),
            id,
            restored: false,
        }
    }

    /// Unlinks layer `id`. Returns true if it was the outermost one.
    fn unlink(&self, id: u64) -> bool {
        let mut chain = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        let Some(index) = chain.layers.iter().position(|layer| layer.id == id) else {
            return false;
        };

        chain.layers.remove(index);
        let outermost = index == chain.layers.len();
        if !outermost {
            chain.rebuild_from(index);
        }
        debug!(
            id,
            outermost,
            depth = chain.layers.len(),
            "Transport wrapper removed"
        );
        outermost
    }
}

impl std::fmt::Debug for TransportSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSlot")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Transport Guard
// ============================================================================

/// Keeps a wrapper installed in a [`TransportSlot`] for its lifetime.
#[must_use = "dropping the guard immediately removes the wrapper"]
pub struct TransportGuard {
    slot: Arc<TransportSlot>,
    id: u64,
    restored: bool,
}

impl TransportGuard {
    /// Removes the wrapper now.
    ///
    /// Returns true if it was the outermost wrapper, so the slot is back to
    /// the exact transport it held before [`TransportSlot::wrap`]. Returns
    /// false if wrappers installed later sat on top of it; they stay
    /// installed and are rebuilt around what was beneath this one.
    pub fn restore(mut self) -> bool {
        self.restore_inner()
    }

    fn restore_inner(&mut self) -> bool {
        if self.restored {
            return false;
        }
        self.restored = true;
        self.slot.unlink(self.id)
    }
}

impl Drop for TransportGuard {
    fn drop(&mut self) {
        self.restore_inner();
    }
}

impl std::fmt::Debug for TransportGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportGuard")
            .field("id", &self.id)
            .field("restored", &self.restored)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use async_trait::async_trait;
    use reqwest::{Request, Response};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullTransport;

    #[async_trait]
    impl HttpTransport for NullTransport {
        async fn execute(&self, _request: Request) -> Result<Response, HttpError> {
            Err(HttpError::Unavailable("null".to_string()))
        }
    }

    /// Counts requests, then forwards them.
    struct Counting {
        inner: Arc<dyn HttpTransport>,
        hits: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl HttpTransport for Counting {
        async fn execute(&self, request: Request) -> Result<Response, HttpError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(request).await
        }
    }

    fn counting(
        hits: &Arc<AtomicUsize>,
    ) -> impl Fn(Arc<dyn HttpTransport>) -> Arc<dyn HttpTransport> + Send + Sync + 'static {
        let hits = Arc::clone(hits);
        move |inner| -> Arc<dyn HttpTransport> {
            Arc::new(Counting {
                inner,
                hits: Arc::clone(&hits),
            })
        }
    }

    fn slot() -> (Arc<TransportSlot>, Arc<dyn HttpTransport>) {
        let base: Arc<dyn HttpTransport> = Arc::new(NullTransport);
        (Arc::new(TransportSlot::new(Arc::clone(&base))), base)
    }

    async fn send(slot: &TransportSlot) {
        let request = Request::new(
            reqwest::Method::GET,
            "http://localhost:8000/api/incidents".parse().unwrap(),
        );
        let _ = slot.current().execute(request).await;
    }

    #[test]
    fn test_drop_restores_identical_transport() {
        let (slot, base) = slot();
        {
            let _guard = slot.wrap(|_| Arc::new(NullTransport));
            assert!(!Arc::ptr_eq(&slot.current(), &base));
            assert_eq!(slot.depth(), 1);
        }
        assert!(Arc::ptr_eq(&slot.current(), &base));
        assert_eq!(slot.depth(), 0);
    }

    #[test]
    fn test_nested_wrappers_unwind_in_order() {
        let (slot, base) = slot();
        let outer = slot.wrap(|_| Arc::new(NullTransport));
        let after_outer = slot.current();
        let inner = slot.wrap(|_| Arc::new(NullTransport));

        assert!(inner.restore());
        assert!(Arc::ptr_eq(&slot.current(), &after_outer));
        assert!(outer.restore());
        assert!(Arc::ptr_eq(&slot.current(), &base));
    }

    #[tokio::test]
    async fn test_out_of_order_restore_unlinks_only_that_wrapper() {
        let (slot, base) = slot();
        let first_hits = Arc::new(AtomicUsize::new(0));
        let second_hits = Arc::new(AtomicUsize::new(0));

        let first = slot.wrap(counting(&first_hits));
        let second = slot.wrap(counting(&second_hits));
        send(&slot).await;
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);

        // Removed from under the second wrapper, which keeps observing
        assert!(!first.restore());
        assert_eq!(slot.depth(), 1);
        send(&slot).await;
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 2);

        assert!(second.restore());
        assert!(Arc::ptr_eq(&slot.current(), &base));
        send(&slot).await;
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_replace_keeps_wrappers_around_new_base() {
        let (slot, base) = slot();
        let guard = slot.wrap(|_| Arc::new(NullTransport));

        let next: Arc<dyn HttpTransport> = Arc::new(NullTransport);
        let previous = slot.replace(Arc::clone(&next));
        assert!(Arc::ptr_eq(&previous, &base));
        assert_eq!(slot.depth(), 1);

        drop(guard);
        assert!(Arc::ptr_eq(&slot.current(), &next));
    }
}
