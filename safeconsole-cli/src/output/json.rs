//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use safeconsole_core::{CallClass, Session, UsageCounters, UsageLevel, UserIdentity};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// ============================================================================
// Output Types
// ============================================================================

/// Session status. The token itself is never printed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
    pub has_token: bool,
}

impl From<&Session> for SessionOutput {
    fn from(session: &Session) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            user: session.user.clone(),
            has_token: session.token.as_deref().is_some_and(|t| !t.is_empty()),
        }
    }
}

/// Quota counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub monthly: QuotaOutput,
    pub daily: QuotaOutput,
    pub modules: BTreeMap<String, u64>,
    pub synced: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_datetime_opt"
    )]
    pub synced_at: Option<DateTime<Utc>>,
}

/// One quota window.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaOutput {
    pub limit: u64,
    pub used: u64,
    pub remaining: u64,
    pub level: UsageLevel,
}

impl From<&UsageCounters> for UsageOutput {
    fn from(counters: &UsageCounters) -> Self {
        Self {
            monthly: QuotaOutput {
                limit: counters.monthly_limit,
                used: counters.monthly_used,
                remaining: counters.remaining(),
                level: counters.usage_level(),
            },
            daily: QuotaOutput {
                limit: counters.daily_limit,
                used: counters.daily_used,
                remaining: counters.daily_remaining(),
                level: counters.daily_level(),
            },
            modules: counters.module_usage.clone(),
            synced: counters.synced_at.is_some(),
            synced_at: counters.synced_at,
        }
    }
}

/// Result of one metered request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutput {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counted_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a batch of metered requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReport {
    pub requests: Vec<RequestOutput>,
    pub usage: UsageOutput,
}

/// Classification of one URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyOutput {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<CallClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Serialization helpers
// ============================================================================

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats session status.
    pub fn format_session(&self, session: &Session) -> Result<String> {
        self.format(&SessionOutput::from(session))
    }

    /// Formats quota counters.
    pub fn format_usage(&self, counters: &UsageCounters) -> Result<String> {
        self.format(&UsageOutput::from(counters))
    }
}

// ============================================================================
// Tests
// ============================================================================
