//! Authenticated session state.

use serde::{Deserialize, Serialize};

use super::identity::UserIdentity;

/// Identity and credential held for the current application instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Logged-in user.
    pub user: Option<UserIdentity>,
    /// Opaque bearer credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    /// Creates an authenticated session.
    pub fn new(user: UserIdentity, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
        }
    }

    /// Creates an empty, unauthenticated session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// True iff both a user and a non-empty token are present.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns the `Authorization` header value for the token, if any.
    pub fn bearer(&self) -> Option<String> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {t}"))
    }
}
