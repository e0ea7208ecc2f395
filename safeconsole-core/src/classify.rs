//! Outgoing call classification.
//!
//! Decides whether a request counts against the API quota and, if so,
//! which functional module it belongs to. Matching is plain,
//! case-insensitive substring matching on the request URL.
//!
//! A call is counted when it targets the backend and is not excluded:
//!
//! - **Backend**: the URL contains a local-dev `host:port`, starts with the
//!   API prefix, or is an absolute `http(s)` URL accepted by the
//!   [`AbsoluteUrlPolicy`].
//! - **Excluded**: authentication, dashboard/KPI, chart-viewing and upload
//!   calls, plus any `GET` for an HTML page.
//!
//! The module is the first keyword hit in [`MODULE_KEYWORDS`], or
//! [`ApiModule::Other`].

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ClassifyError;

// ============================================================================
// API Module
// ============================================================================

/// Functional area a call is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiModule {
    /// Incident reporting.
    Incidents,
    /// Training records.
    Training,
    /// Audits and inspections.
    Audits,
    /// Permit-to-work.
    PermitToWork,
    /// Medical cases.
    Medical,
    /// Personal protective equipment.
    Ppe,
    /// Root cause analysis.
    Rca,
    /// Environmental metrics.
    Environmental,
    /// Governance.
    Governance,
    /// Unsafe act/condition reports.
    Unsafety,
    /// Reports.
    Reports,
    /// Anything not matched by a keyword.
    Other,
}

impl ApiModule {
    /// Returns the name used as the usage-breakdown key.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Incidents => "Incidents",
            Self::Training => "Training",
            Self::Audits => "Audits",
            Self::PermitToWork => "Permit to Work",
            Self::Medical => "Medical",
            Self::Ppe => "PPE",
            Self::Rca => "RCA",
            Self::Environmental => "Environmental",
            Self::Governance => "Governance",
            Self::Unsafety => "Unsafety",
            Self::Reports => "Reports",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for ApiModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Keyword to module mapping. Order matters: first match wins.
pub const MODULE_KEYWORDS: &[(&str, ApiModule)] = &[
    ("incident", ApiModule::Incidents),
    ("training", ApiModule::Training),
    ("audit", ApiModule::Audits),
    ("inspection", ApiModule::Audits),
    ("permit", ApiModule::PermitToWork),
    ("ptw", ApiModule::PermitToWork),
    ("medical", ApiModule::Medical),
    ("ppe", ApiModule::Ppe),
    ("rca", ApiModule::Rca),
    ("environment", ApiModule::Environmental),
    ("governance", ApiModule::Governance),
    ("unsafe", ApiModule::Unsafety),
    ("report", ApiModule::Reports),
];

const AUTH_MARKERS: &[&str] = &["/auth/", "/login", "/logout", "/register", "/token"];
const DASHBOARD_MARKERS: &[&str] = &["/dashboard", "/kpi"];
const CHART_MARKERS: &[&str] = &["/chart", "chart-view"];
const UPLOAD_MARKERS: &[&str] = &["/upload"];
const HTML_SUFFIXES: &[&str] = &[".html", ".htm"];

// ============================================================================
// Classification Result
// ============================================================================

/// Why a backend call is not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Login, logout, token and registration calls.
    Auth,
    /// Dashboard and KPI widgets.
    Dashboard,
    /// Chart views and HTML pages.
    Chart,
    /// File uploads.
    Upload,
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Dashboard => write!(f, "dashboard"),
            Self::Chart => write!(f, "chart"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// Outcome of classifying one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "detail", rename_all = "snake_case")]
pub enum CallClass {
    /// Backend call that counts against the quota.
    Countable(ApiModule),
    /// Backend call that never counts.
    Excluded(Exclusion),
    /// Not a backend call at all.
    Untracked,
}

impl CallClass {
    /// The module to charge, for countable calls.
    pub fn module(&self) -> Option<ApiModule> {
        match self {
            Self::Countable(module) => Some(*module),
            _ => None,
        }
    }
}

// ============================================================================
// Classifier Configuration
// ============================================================================

/// Which absolute `http(s)` URLs count as backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AbsoluteUrlPolicy {
    /// Only hosts listed in `backend_hosts`.
    #[default]
    BackendHosts,
    /// Every absolute `http(s)` URL, including third-party assets.
    AnyHttp,
}

impl std::fmt::Display for AbsoluteUrlPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackendHosts => write!(f, "backend_hosts"),
            Self::AnyHttp => write!(f, "any_http"),
        }
    }
}

/// Tunable inputs of the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// `host:port` pairs of local development backends.
    pub local_dev_hosts: Vec<String>,
    /// Path prefix of relative API calls.
    pub api_prefix: String,
    /// Hosts (and their subdomains) of the production backend.
    pub backend_hosts: Vec<String>,
    /// Policy for other absolute URLs.
    pub absolute_urls: AbsoluteUrlPolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            local_dev_hosts: vec!["localhost:8000".to_string(), "127.0.0.1:8000".to_string()],
            api_prefix: "/api/".to_string(),
            backend_hosts: Vec::new(),
            absolute_urls: AbsoluteUrlPolicy::default(),
        }
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Classifies outgoing calls for usage accounting.
#[derive(Debug, Clone)]
pub struct CallClassifier {
    local_dev_hosts: Vec<String>,
    api_prefix: String,
    backend_hosts: Vec<String>,
    absolute_urls: AbsoluteUrlPolicy,
}

impl CallClassifier {
    /// Builds a classifier from its configuration.
    pub fn new(config: &ClassifierConfig) -> Self {
        let lower = |items: &[String]| {
            items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        };
        Self {
            local_dev_hosts: lower(&config.local_dev_hosts),
            api_prefix: config.api_prefix.trim().to_lowercase(),
            backend_hosts: lower(&config.backend_hosts),
            absolute_urls: config.absolute_urls,
        }
    }

    /// Classifies a call by HTTP method and URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] for an empty URL, or for an absolute URL
    /// that cannot be parsed when the host has to be checked.
    pub fn classify(&self, method: &str, url: &str) -> Result<CallClass, ClassifyError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ClassifyError::EmptyUrl);
        }
        let lower = url.to_lowercase();

        if !self.is_backend_call(&lower)? {
            return Ok(CallClass::Untracked);
        }
        if let Some(reason) = exclusion(method, &lower) {
            return Ok(CallClass::Excluded(reason));
        }
        Ok(CallClass::Countable(module_for(&lower)))
    }

    fn is_backend_call(&self, lower: &str) -> Result<bool, ClassifyError> {
        if self.local_dev_hosts.iter().any(|h| lower.contains(h.as_str())) {
            return Ok(true);
        }
        if !self.api_prefix.is_empty() && lower.starts_with(&self.api_prefix) {
            return Ok(true);
        }
        if !lower.starts_with("http") {
            return Ok(false);
        }

        match self.absolute_urls {
            AbsoluteUrlPolicy::AnyHttp => Ok(true),
            AbsoluteUrlPolicy::BackendHosts => {
                let parsed = Url::parse(lower).map_err(|e| ClassifyError::MalformedUrl {
                    url: lower.to_string(),
                    reason: e.to_string(),
                })?;
                let Some(host) = parsed.host_str() else {
                    return Ok(false);
                };
                Ok(self
                    .backend_hosts
                    .iter()
                    .any(|domain| host == domain || host.ends_with(&format!(".{domain}"))))
            }
        }
    }
}

impl Default for CallClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

fn exclusion(method: &str, lower: &str) -> Option<Exclusion> {
    let contains_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if contains_any(AUTH_MARKERS) {
        return Some(Exclusion::Auth);
    }
    if contains_any(DASHBOARD_MARKERS) {
        return Some(Exclusion::Dashboard);
    }
    if contains_any(CHART_MARKERS) || (method.eq_ignore_ascii_case("GET") && is_html_page(lower)) {
        return Some(Exclusion::Chart);
    }
    if contains_any(UPLOAD_MARKERS) {
        return Some(Exclusion::Upload);
    }
    None
}

fn is_html_page(lower: &str) -> bool {
    let path = lower.split(['?', '#']).next().unwrap_or(lower);
    HTML_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Maps a lowercased URL to its module by first keyword hit.
fn module_for(lower: &str) -> ApiModule {
    MODULE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(ApiModule::Other, |(_, module)| *module)
}

// ============================================================================
// Tests
// ============================================================================
