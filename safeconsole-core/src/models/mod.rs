//! Domain models for SafeConsole.
//!
//! ## Submodules
//!
//! - [`identity`] - User identity (UserIdentity, Role, SubscriptionTier, AccountStatus)
//! - [`session`] - Authenticated session
//! - [`usage`] - Usage types (UsageCounters, UsageLimits, RateLimitReport)

mod identity;
mod session;
mod usage;

// Re-export everything at the models level
pub use identity::{AccountStatus, Role, SubscriptionTier, UserIdentity};
pub use session::Session;
pub use usage::{
    DEFAULT_DAILY_LIMIT, DEFAULT_MONTHLY_LIMIT, RateLimitReport, UsageCounters, UsageLevel,
    UsageLimits,
};
#[cfg(test)]
mod serde_tests;
