// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `SafeConsole` Core
//!
//! Core types, models, and call classification for the `SafeConsole`
//! safety dashboard client.
//!
//! This crate provides the foundational abstractions used across all other
//! `SafeConsole` crates, including:
//!
//! - Domain models (identity, session, usage counters)
//! - Error types
//! - The URL classifier behind usage accounting
//!
//! ## Key Types
//!
//! ### Identity & Session
//! - [`UserIdentity`] - Identity record of the logged-in user
//! - [`Role`], [`SubscriptionTier`], [`AccountStatus`] - Identity enums
//! - [`Session`] - Identity plus credential
//!
//! ### Usage Types
//! - [`UsageCounters`] - Monthly/daily counters and per-module breakdown
//! - [`UsageLimits`] - Default ceilings
//! - [`RateLimitReport`] - Rate-limit endpoint response
//!
//! ### Classification
//! - [`CallClassifier`] - Decides whether and where a call is counted
//! - [`CallClass`], [`ApiModule`], [`Exclusion`] - Classification results

pub mod classify;
pub mod error;
pub mod models;

// Re-export error types
pub use error::{ClassifyError, CoreError};

// Re-export all model types
pub use models::{
    // Identity & session
    AccountStatus,
    Role,
    Session,
    SubscriptionTier,
    UserIdentity,
    // Usage types
    DEFAULT_DAILY_LIMIT,
    DEFAULT_MONTHLY_LIMIT,
    RateLimitReport,
    UsageCounters,
    UsageLevel,
    UsageLimits,
};

// Re-export classification
pub use classify::{
    AbsoluteUrlPolicy, ApiModule, CallClass, CallClassifier, ClassifierConfig, Exclusion,
};
