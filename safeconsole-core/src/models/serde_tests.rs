//! Serde tests for the persisted and wire-level core types.
//!
//! The identity record is what ends up in durable storage, and the counters
//! are what the CLI prints as JSON, so their field names are a contract.

use crate::{AccountStatus, Role, Session, SubscriptionTier, UsageCounters, UserIdentity};

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_role_wire_names() {
    let cases = [
        (Role::Admin, r#""admin""#),
        (Role::SafetyManager, r#""safety_manager""#),
        (Role::Viewer, r#""viewer""#),
    ];
    for (role, json) in cases {
        assert_eq!(serde_json::to_string(&role).unwrap(), json);
    }
}

#[test]
fn test_identity_field_names() {
    let user = UserIdentity::new("42", "Kim", "kim@example.com", Role::SafetyManager)
        .with_organization("Acme Mining")
        .with_tier(SubscriptionTier::Enterprise)
        .with_status(AccountStatus::Suspended);
    let value = serde_json::to_value(&user).unwrap();

    assert_eq!(value["id"], "42");
    assert_eq!(value["role"], "safety_manager");
    assert_eq!(value["organization"], "Acme Mining");
    assert_eq!(value["subscription_tier"], "enterprise");
    assert_eq!(value["status"], "suspended");
}

#[test]
fn test_identity_without_organization_omits_field() {
    let user = UserIdentity::new("1", "Lee", "lee@example.com", Role::Employee);
    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("organization").is_none());
}

#[test]
fn test_garbage_identity_fails_to_parse() {
    assert!(serde_json::from_str::<UserIdentity>("not json at all").is_err());
    assert!(serde_json::from_str::<UserIdentity>("{\"id\": 1}").is_err());
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn test_anonymous_session_serializes_without_token() {
    let value = serde_json::to_value(Session::anonymous()).unwrap();
    assert!(value["user"].is_null());
    assert!(value.get("token").is_none());
}

// ============================================================================
// Usage Counters
// ============================================================================

#[test]
fn test_counters_json_shape() {
    let mut counters = UsageCounters::default();
    counters.increment("Incidents", 2);
    let value = serde_json::to_value(&counters).unwrap();

    assert_eq!(value["monthly_limit"], 1000);
    assert_eq!(value["monthly_used"], 2);
    assert_eq!(value["module_usage"]["Incidents"], 2);
    assert!(value.get("synced_at").is_none());
}
