//! User identity types.
//!
//! This module contains the identity record handed over by the external
//! login flow:
//! - [`UserIdentity`] - The authenticated user
//! - [`Role`] - Fixed set of console roles
//! - [`SubscriptionTier`] - Organization subscription plan
//! - [`AccountStatus`] - Account lifecycle state

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Role
// ============================================================================

/// Roles a console user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Owns the safety program for an organization.
    SafetyManager,
    /// Supervises a site or crew.
    Supervisor,
    /// Performs audits and inspections.
    Auditor,
    /// Regular employee reporting incidents and taking training.
    #[default]
    Employee,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Returns all roles.
    pub fn all() -> &'static [Role] {
        &[
            Self::Admin,
            Self::SafetyManager,
            Self::Supervisor,
            Self::Auditor,
            Self::Employee,
            Self::Viewer,
        ]
    }

    /// Returns the wire name (`snake_case`) for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SafetyManager => "safety_manager",
            Self::Supervisor => "supervisor",
            Self::Auditor => "auditor",
            Self::Employee => "employee",
            Self::Viewer => "viewer",
        }
    }

    /// Returns the display name for this role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::SafetyManager => "Safety Manager",
            Self::Supervisor => "Supervisor",
            Self::Auditor => "Auditor",
            Self::Employee => "Employee",
            Self::Viewer => "Viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| CoreError::InvalidData(format!("unknown role: {s}")))
    }
}

// ============================================================================
// Subscription Tier
// ============================================================================

/// Subscription plan of the user's organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// Free plan.
    #[default]
    Free,
    /// Basic paid plan.
    Basic,
    /// Professional plan.
    Professional,
    /// Enterprise plan.
    Enterprise,
}

impl SubscriptionTier {
    /// Returns all tiers.
    pub fn all() -> &'static [SubscriptionTier] {
        &[Self::Free, Self::Basic, Self::Professional, Self::Enterprise]
    }

    /// Returns the wire name for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "Free"),
            Self::Basic => write!(f, "Basic"),
            Self::Professional => write!(f, "Professional"),
            Self::Enterprise => write!(f, "Enterprise"),
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|tier| tier.as_str() == wanted)
            .ok_or_else(|| CoreError::InvalidData(format!("unknown subscription tier: {s}")))
    }
}

// ============================================================================
// Account Status
// ============================================================================

/// Lifecycle state of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account is active.
    #[default]
    Active,
    /// Invitation sent, not yet confirmed.
    Pending,
    /// Temporarily blocked by an administrator.
    Suspended,
    /// Deactivated.
    Inactive,
}

impl AccountStatus {
    /// Returns all statuses.
    pub fn all() -> &'static [AccountStatus] {
        &[Self::Active, Self::Pending, Self::Suspended, Self::Inactive]
    }

    /// Returns the wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Suspended => "suspended",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| CoreError::InvalidData(format!("unknown account status: {s}")))
    }
}

// ============================================================================
// User Identity
// ============================================================================

/// Identity record of an authenticated user.
///
/// Produced by the external login flow and persisted verbatim as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Backend user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Console role.
    pub role: Role,
    /// Organization the user belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Subscription plan.
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
    /// Account status.
    #[serde(default)]
    pub status: AccountStatus,
}

impl UserIdentity {
    /// Creates an identity with default tier and status.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            organization: None,
            subscription_tier: SubscriptionTier::default(),
            status: AccountStatus::default(),
        }
    }

    /// Sets the organization.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Sets the subscription tier.
    #[must_use]
    pub fn with_tier(mut self, tier: SubscriptionTier) -> Self {
        self.subscription_tier = tier;
        self
    }

    /// Sets the account status.
    #[must_use]
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str_accepts_variants() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Safety Manager".parse::<Role>().unwrap(), Role::SafetyManager);
        assert_eq!("safety-manager".parse::<Role>().unwrap(), Role::SafetyManager);
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn test_identity_defaults_when_fields_missing() {
        let json = r#"{"id":"u1","name":"Ana","email":"ana@example.com","role":"auditor"}"#;
        let user: UserIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Auditor);
        assert_eq!(user.subscription_tier, SubscriptionTier::Free);
        assert_eq!(user.status, AccountStatus::Active);
        assert!(user.organization.is_none());
    }

    #[test]
    fn test_identity_rejects_unknown_role() {
        let json = r#"{"id":"u1","name":"Ana","email":"a@b.c","role":"janitor"}"#;
        assert!(serde_json::from_str::<UserIdentity>(json).is_err());
    }
}
