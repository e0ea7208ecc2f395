//! Authenticated session state.
//!
//! The session lives in a watch channel so any number of readers can follow
//! login and logout. Durable copies of the identity and token are kept in a
//! [`KeyValueStore`] under [`USER_KEY`] and [`TOKEN_KEY`].

use std::sync::Arc;

use safeconsole_core::{Session, UserIdentity};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;

/// Storage key for the serialized identity.
pub const USER_KEY: &str = "user";

/// Storage key for the raw token.
pub const TOKEN_KEY: &str = "token";

// ============================================================================
// Session Store
// ============================================================================

/// Holds the current session and keeps storage in step with it.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Restores the session persisted in `storage`.
    ///
    /// Unreadable or corrupted records are logged and treated as absent;
    /// storage is left as found.
    pub async fn initialize(storage: Arc<dyn KeyValueStore>) -> Self {
        let user = Self::read_user(storage.as_ref()).await;
        let token = match storage.get(TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        };

        let session = Session { user, token };
        debug!(authenticated = session.is_authenticated(), "Session restored");

        let (state, _) = watch::channel(session);
        Self { storage, state }
    }

    async fn read_user(storage: &dyn KeyValueStore) -> Option<UserIdentity> {
        let raw = match storage.get(USER_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user record is corrupted, ignoring it");
                None
            }
        }
    }

    /// Records a successful login.
    ///
    /// Storage failures are logged; the in-memory session becomes
    /// authenticated regardless.
    pub async fn login(&self, user: UserIdentity, token: impl Into<String>) {
        let token = token.into();
        let user_id = user.id.clone();

        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(e) = self.storage.set(USER_KEY, &json).await {
                    warn!(error = %e, "Failed to persist user");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize user"),
        }
        if let Err(e) = self.storage.set(TOKEN_KEY, &token).await {
            warn!(error = %e, "Failed to persist token");
        }

        self.state.send_replace(Session::new(user, token));
        info!(user_id = %user_id, "Logged in");
    }

    /// Clears the session from memory and storage. Safe to call repeatedly.
    pub async fn logout(&self) {
        for key in [USER_KEY, TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                warn!(key = %key, error = %e, "Failed to clear stored session");
            }
        }

        let changed = self.state.send_if_modified(|session| {
            if session.user.is_none() && session.token.is_none() {
                return false;
            }
            *session = Session::anonymous();
            true
        });
        if changed {
            info!("Logged out");
        } else {
            debug!("Logout with no active session");
        }
    }

    /// Whether a user and a non-empty token are both present.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// A copy of the current session.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// The current user, if any.
    pub fn user(&self) -> Option<UserIdentity> {
        self.state.borrow().user.clone()
    }

    /// The current token, if any.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Subscribes to login and logout.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use safeconsole_core::Role;

    fn alice() -> UserIdentity {
        UserIdentity::new("u-1", "Alice", "alice@example.com", Role::SafetyManager)
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::initialize(storage.clone()).await;
        assert!(!store.is_authenticated());

        store.login(alice(), "t0k").await;
        assert!(store.is_authenticated());
        assert_eq!(store.user(), Some(alice()));
        assert_eq!(store.token().as_deref(), Some("t0k"));

        store.logout().await;
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(storage.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_reinitialize_restores_login() {
        let storage = Arc::new(MemoryStorage::new());
        SessionStore::initialize(storage.clone())
            .await
            .login(alice(), "t0k")
            .await;

        let restored = SessionStore::initialize(storage.clone()).await;
        assert!(restored.is_authenticated());
        assert_eq!(restored.user(), Some(alice()));

        restored.logout().await;
        let after_logout = SessionStore::initialize(storage).await;
        assert!(!after_logout.is_authenticated());
    }

    #[tokio::test]
    async fn test_corrupted_user_is_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(USER_KEY, "{not json").await.unwrap();
        storage.set(TOKEN_KEY, "t0k").await.unwrap();

        let store = SessionStore::initialize(storage.clone()).await;
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert_eq!(store.token().as_deref(), Some("t0k"));
        // Left as found
        assert_eq!(
            storage.get(USER_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn test_empty_token_is_not_authenticated() {
        let store = SessionStore::initialize(Arc::new(MemoryStorage::new())).await;
        store.login(alice(), "").await;
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_notifies_once() {
        let store = SessionStore::initialize(Arc::new(MemoryStorage::new())).await;
        let mut rx = store.subscribe();

        store.login(alice(), "t0k").await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.logout().await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.logout().await;
        assert!(!rx.has_changed().unwrap());
        assert!(!store.is_authenticated());
    }
}
