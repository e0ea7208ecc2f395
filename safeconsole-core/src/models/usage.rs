//! Usage-related types.
//!
//! This module contains types related to API quota accounting:
//! - [`UsageCounters`] - Monthly/daily counters plus per-module breakdown
//! - [`UsageLimits`] - Default ceilings used before the remote sync
//! - [`UsageLevel`] - Coarse level for display
//! - [`RateLimitReport`] - Rate-limit endpoint response

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default monthly call ceiling.
pub const DEFAULT_MONTHLY_LIMIT: u64 = 1000;

/// Default daily call ceiling.
pub const DEFAULT_DAILY_LIMIT: u64 = 100;

/// Percentage at which usage is reported as [`UsageLevel::Warning`].
const WARNING_PERCENT: f64 = 80.0;

// ============================================================================
// Usage Limits
// ============================================================================

/// Ceilings a meter starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimits {
    /// Monthly call ceiling.
    pub monthly: u64,
    /// Daily call ceiling.
    pub daily: u64,
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            monthly: DEFAULT_MONTHLY_LIMIT,
            daily: DEFAULT_DAILY_LIMIT,
        }
    }
}

// ============================================================================
// Usage Level
// ============================================================================

/// Coarse quota state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    /// Comfortably below the ceiling.
    Normal,
    /// At or above 80% of the ceiling.
    Warning,
    /// Ceiling reached.
    Exhausted,
}

impl UsageLevel {
    fn from_counts(used: u64, limit: u64) -> Self {
        if limit == 0 || used >= limit {
            return Self::Exhausted;
        }
        #[allow(clippy::cast_precision_loss)]
        let percent = used as f64 / limit as f64 * 100.0;
        if percent >= WARNING_PERCENT {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

impl std::fmt::Display for UsageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

// ============================================================================
// Usage Counters
// ============================================================================

/// Running tally of API calls against monthly and daily ceilings.
///
/// Remaining values are always derived from `limit - used` and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    /// Monthly call ceiling.
    pub monthly_limit: u64,
    /// Calls used this month.
    pub monthly_used: u64,
    /// Daily call ceiling.
    pub daily_limit: u64,
    /// Calls used today.
    pub daily_used: u64,
    /// Calls attributed to each functional module.
    pub module_usage: BTreeMap<String, u64>,
    /// Last successful sync with the rate-limit endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl UsageCounters {
    /// Creates zeroed counters with the given ceilings.
    pub fn new(limits: UsageLimits) -> Self {
        Self {
            monthly_limit: limits.monthly,
            monthly_used: 0,
            daily_limit: limits.daily,
            daily_used: 0,
            module_usage: BTreeMap::new(),
            synced_at: None,
        }
    }

    /// Records `count` calls against `module`.
    ///
    /// The monthly counter is clamped at the monthly limit; the module
    /// breakdown is not.
    pub fn increment(&mut self, module: &str, count: u64) {
        self.monthly_used = self
            .monthly_used
            .saturating_add(count)
            .min(self.monthly_limit);
        let entry = self.module_usage.entry(module.to_string()).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Monthly calls left.
    pub fn remaining(&self) -> u64 {
        self.monthly_limit.saturating_sub(self.monthly_used)
    }

    /// Daily calls left.
    pub fn daily_remaining(&self) -> u64 {
        self.daily_limit.saturating_sub(self.daily_used)
    }

    /// Calls recorded for a module (0 if never seen).
    pub fn module_count(&self, module: &str) -> u64 {
        self.module_usage.get(module).copied().unwrap_or(0)
    }

    /// Coarse monthly usage level.
    pub fn usage_level(&self) -> UsageLevel {
        UsageLevel::from_counts(self.monthly_used, self.monthly_limit)
    }

    /// Coarse daily usage level.
    pub fn daily_level(&self) -> UsageLevel {
        UsageLevel::from_counts(self.daily_used, self.daily_limit)
    }

    /// Overwrites the fields carried by a rate-limit report.
    pub fn apply_report(&mut self, report: &RateLimitReport) {
        if let Some(limit) = report.monthly_limit() {
            self.monthly_limit = limit;
        }
        if let Some(used) = report.monthly_used() {
            self.monthly_used = used;
        }
        if let Some(limit) = report.daily_limit {
            self.daily_limit = limit;
        }
        if let Some(used) = report.daily_used {
            self.daily_used = used;
        }
        self.synced_at = Some(Utc::now());
    }
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self::new(UsageLimits::default())
    }
}

// ============================================================================
// Rate Limit Report
// ============================================================================

/// Response body of the rate-limit endpoint.
///
/// Backends disagree on field names, so both the `api_calls_*` and the
/// `monthly_*` spellings are accepted. The `api_calls_*` spelling wins when
/// both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitReport {
    /// Monthly ceiling (`api_calls_*` spelling).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_calls_limit: Option<u64>,
    /// Monthly usage (`api_calls_*` spelling).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_calls_used: Option<u64>,
    /// Monthly ceiling (`monthly_*` spelling).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_limit: Option<u64>,
    /// Monthly usage (`monthly_*` spelling).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_used: Option<u64>,
    /// Daily ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u64>,
    /// Daily usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_used: Option<u64>,
}

impl RateLimitReport {
    /// Reported monthly ceiling under either spelling.
    pub fn monthly_limit(&self) -> Option<u64> {
        self.api_calls_limit.or(self.monthly_limit)
    }

    /// Reported monthly usage under either spelling.
    pub fn monthly_used(&self) -> Option<u64> {
        self.api_calls_used.or(self.monthly_used)
    }

    /// True if the report carries no recognized field.
    pub fn is_empty(&self) -> bool {
        self.monthly_limit().is_none()
            && self.monthly_used().is_none()
            && self.daily_limit.is_none()
            && self.daily_used.is_none()
    }
}
