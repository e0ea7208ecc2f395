//! API usage accounting.
//!
//! The meter keeps [`UsageCounters`] in a watch channel, seeds them from the
//! backend's rate-limit endpoint, and counts outgoing calls once mounted on
//! a [`TransportSlot`].

use std::sync::Arc;

use reqwest::Request;
use safeconsole_core::{
    ApiModule, CallClass, CallClassifier, RateLimitReport, UsageCounters, UsageLimits,
};
use safeconsole_fetch::{
    FetchError, HttpClient, HttpTransport, ObservedTransport, RequestObserver, TransportGuard,
    TransportSlot,
};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

// ============================================================================
// Usage Meter
// ============================================================================

/// Counts billable backend calls against monthly and daily quotas.
pub struct UsageMeter {
    counters: watch::Sender<UsageCounters>,
    classifier: CallClassifier,
}

impl UsageMeter {
    /// Creates a meter with zeroed counters and the given ceilings.
    pub fn new(limits: UsageLimits, classifier: CallClassifier) -> Self {
        let (counters, _) = watch::channel(UsageCounters::new(limits));
        Self {
            counters,
            classifier,
        }
    }

    // ========================================================================
    // Remote Sync
    // ========================================================================

    /// Seeds the counters from the rate-limit endpoint at `url`.
    ///
    /// Failures are logged and leave the counters as they were. Returns
    /// whether a report was applied.
    pub async fn initialize(&self, client: &HttpClient, url: &str) -> bool {
        match self.sync_from_remote(client, url).await {
            Ok(_) => true,
            Err(e) => {
                warn!(url = %url, error = %e, "Rate-limit sync failed, keeping defaults");
                false
            }
        }
    }

    /// Fetches a rate-limit report and applies it to the counters.
    ///
    /// # Errors
    ///
    /// Returns the transport, status, or decoding error; the counters are
    /// untouched in that case.
    pub async fn sync_from_remote(
        &self,
        client: &HttpClient,
        url: &str,
    ) -> Result<RateLimitReport, FetchError> {
        debug!(url = %url, "Syncing usage from backend");
        let report: RateLimitReport = client.get_json(url).await?;

        if report.is_empty() {
            debug!("Rate-limit report carried no known fields");
        }
        self.counters
            .send_modify(|counters| counters.apply_report(&report));

        let counters = self.counters.borrow();
        info!(
            monthly_used = counters.monthly_used,
            monthly_limit = counters.monthly_limit,
            daily_used = counters.daily_used,
            daily_limit = counters.daily_limit,
            "Usage synced"
        );
        drop(counters);
        Ok(report)
    }

    // ========================================================================
    // Counting
    // ========================================================================

    /// Records `count` calls against `module`.
    ///
    /// Monthly usage stops at the monthly limit; the per-module count does
    /// not.
    pub fn increment_usage(&self, module: &str, count: u64) {
        let mut total = 0;
        self.counters.send_modify(|counters| {
            counters.increment(module, count);
            total = counters.module_count(module);
        });
        debug!(module = %module, count = count, total = total, "Usage incremented");
    }

    /// Classifies a call and counts it if billable.
    ///
    /// Returns the module charged. Classification errors are logged at
    /// trace level and leave the call uncounted.
    pub fn record_call(&self, method: &str, url: &str) -> Option<ApiModule> {
        match self.classifier.classify(method, url) {
            Ok(CallClass::Countable(module)) => {
                trace!(method = %method, url = %url, module = %module, "Counting call");
                self.increment_usage(module.display_name(), 1);
                Some(module)
            }
            Ok(class) => {
                trace!(method = %method, url = %url, class = ?class, "Call not counted");
                None
            }
            Err(e) => {
                trace!(method = %method, url = %url, error = %e, "Call not classifiable");
                None
            }
        }
    }

    // ========================================================================
    // Interception
    // ========================================================================

    /// Installs the meter in front of the slot's current transport.
    ///
    /// Every call sent through the slot is counted before being forwarded
    /// unchanged. Dropping the guard puts the original transport back.
    pub fn mount(self: &Arc<Self>, slot: &Arc<TransportSlot>) -> TransportGuard {
        let observer: Arc<dyn RequestObserver> = self.clone();
        let guard = slot.wrap(move |inner| -> Arc<dyn HttpTransport> {
            Arc::new(ObservedTransport::new(inner, Arc::clone(&observer)))
        });
        debug!("Usage meter mounted");
        guard
    }

    /// Removes the meter installed by [`UsageMeter::mount`].
    ///
    /// The meter stops counting either way. Returns false if another
    /// wrapper was installed on top in the meantime; that wrapper stays.
    pub fn unmount(guard: TransportGuard) -> bool {
        let restored = guard.restore();
        debug!(restored = restored, "Usage meter unmounted");
        restored
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Monthly calls left.
    pub fn remaining(&self) -> u64 {
        self.counters.borrow().remaining()
    }

    /// Daily calls left.
    pub fn daily_remaining(&self) -> u64 {
        self.counters.borrow().daily_remaining()
    }

    /// A copy of the current counters.
    pub fn snapshot(&self) -> UsageCounters {
        self.counters.borrow().clone()
    }

    /// Subscribes to counter changes.
    pub fn subscribe(&self) -> watch::Receiver<UsageCounters> {
        self.counters.subscribe()
    }

    /// The classifier deciding what counts.
    pub fn classifier(&self) -> &CallClassifier {
        &self.classifier
    }
}

impl RequestObserver for UsageMeter {
    fn on_request(&self, request: &Request) {
        self.record_call(request.method().as_str(), request.url().as_str());
    }
}

impl std::fmt::Debug for UsageMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageMeter")
            .field("counters", &*self.counters.borrow())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
