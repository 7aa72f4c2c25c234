//! Staff session management.
//!
//! One [`SessionManager`] is the single in-memory authority for the bearer
//! token and the identity decoded from it. Durable storage mirrors every
//! transition but is never consulted after startup.
//!
//! # State machine
//!
//! ```text
//! Unauthenticated --login--> Authenticated --(logout | token rejected)--> Unauthenticated
//! ```
//!
//! A login in flight is not a state: nothing is stored or published until the
//! backend has answered.

pub mod claims;
pub mod store;

pub use claims::{ClaimsError, TokenClaims, decode_claims};
pub use store::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore, StoreError};

use chrono::{DateTime, Utc};
use honor_loyalty_core::StaffIdentity;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{RwLock, watch};

use crate::error::ApiError;

/// Where the front end should take the user after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

/// Observable session state. Carries the identity, never the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(StaffIdentity),
}

impl SessionState {
    /// The screen that matches this state.
    #[must_use]
    pub const fn screen(&self) -> Screen {
        match self {
            Self::Unauthenticated => Screen::Login,
            Self::Authenticated(_) => Screen::Dashboard,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndReason {
    Logout,
    Rejected,
}

struct Credentials {
    token: SecretString,
    identity: StaffIdentity,
    expires_at: Option<DateTime<Utc>>,
}

/// Owner of the staff session.
pub struct SessionManager {
    store: Box<dyn SessionStore>,
    current: RwLock<Option<Credentials>>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Restore the session persisted in `store`.
    ///
    /// Unreadable storage and a token without an identity (or the reverse)
    /// start unauthenticated, and the stale data is cleared. The token itself
    /// is not checked: the backend rejects it on first use if it has expired.
    pub fn restore(store: impl SessionStore + 'static) -> Self {
        let credentials = match store.load() {
            Ok(PersistedSession {
                token: Some(token),
                staff: Some(identity),
            }) => {
                let expires_at = decode_claims(&token).ok().and_then(|c| c.expires_at);
                Some(Credentials {
                    token: SecretString::from(token),
                    identity,
                    expires_at,
                })
            }
            Ok(PersistedSession {
                token: None,
                staff: None,
            }) => None,
            Ok(_) => {
                tracing::warn!("Stored session is missing its token or identity, discarding");
                discard(&store);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored session is unreadable, discarding");
                discard(&store);
                None
            }
        };

        let initial = credentials.as_ref().map_or(SessionState::Unauthenticated, |c| {
            SessionState::Authenticated(c.identity.clone())
        });
        if let SessionState::Authenticated(identity) = &initial {
            tracing::debug!(username = %identity.username, "Restored staff session");
        }

        Self {
            store: Box::new(store),
            current: RwLock::new(credentials),
            state: watch::Sender::new(initial),
        }
    }

    /// Adopt a token just issued by the backend.
    ///
    /// Decodes the claims for display, persists token and identity, and
    /// publishes the authenticated state.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MalformedToken` if the claims cannot be read, or
    /// `ApiError::Storage` if the session cannot be persisted. In both cases
    /// the previous state is kept.
    pub async fn establish(&self, token: SecretString) -> Result<Screen, ApiError> {
        let claims = decode_claims(token.expose_secret())
            .map_err(|e| ApiError::MalformedToken(e.to_string()))?;

        // Storage and memory change together under the write guard
        let mut current = self.current.write().await;
        self.store.save(&PersistedSession {
            token: Some(token.expose_secret().to_owned()),
            staff: Some(claims.identity.clone()),
        })?;
        *current = Some(Credentials {
            token,
            identity: claims.identity.clone(),
            expires_at: claims.expires_at,
        });

        tracing::info!(
            username = %claims.identity.username,
            role = %claims.identity.role,
            "Staff logged in"
        );
        self.state
            .send_replace(SessionState::Authenticated(claims.identity));

        Ok(Screen::Dashboard)
    }

    /// End the session. Always succeeds locally; no server round trip.
    pub async fn logout(&self) -> Screen {
        let mut current = self.current.write().await;
        self.end(&mut current, EndReason::Logout)
    }

    /// End the session because the backend rejected `rejected_token`.
    ///
    /// If the held token has changed since the request was sent (a new login
    /// raced the rejection) the newer session is left alone.
    pub async fn expire(&self, rejected_token: &SecretString) -> Screen {
        let mut current = self.current.write().await;
        let is_current = current
            .as_ref()
            .is_some_and(|c| c.token.expose_secret() == rejected_token.expose_secret());

        if is_current {
            self.end(&mut current, EndReason::Rejected)
        } else {
            tracing::debug!("Ignoring rejection of a token that is no longer held");
            self.state.borrow().screen()
        }
    }

    fn end(&self, current: &mut Option<Credentials>, reason: EndReason) -> Screen {
        let previous = current.take();

        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }

        match (reason, previous) {
            (EndReason::Logout, Some(c)) => {
                tracing::info!(username = %c.identity.username, "Staff logged out");
            }
            (EndReason::Rejected, Some(c)) => {
                tracing::warn!(
                    username = %c.identity.username,
                    "Token rejected by backend, session cleared"
                );
            }
            (_, None) => {}
        }

        self.state.send_replace(SessionState::Unauthenticated);
        Screen::Login
    }

    /// The held bearer credential, if any.
    pub async fn token(&self) -> Option<SecretString> {
        self.current.read().await.as_ref().map(|c| c.token.clone())
    }

    /// True iff a token is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Identity decoded from the held token.
    pub async fn identity(&self) -> Option<StaffIdentity> {
        self.current.read().await.as_ref().map(|c| c.identity.clone())
    }

    /// Expiry advertised by the held token, if it carries one.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.current.read().await.as_ref().and_then(|c| c.expires_at)
    }

    /// Current observable state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent session transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn discard(store: &impl SessionStore) {
    if let Err(e) = store.clear() {
        tracing::warn!(error = %e, "Failed to clear stored session");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use honor_loyalty_core::StaffRole;

    use super::*;

    fn manager() -> (SessionManager, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (SessionManager::restore(Arc::clone(&store)), store)
    }

    fn token(username: &str) -> SecretString {
        SecretString::from(claims::encode_unsigned(username, StaffRole::Staff, None))
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let (session, _) = manager();
        assert!(!session.is_authenticated().await);
        assert!(session.identity().await.is_none());
        assert_eq!(session.state().screen(), Screen::Login);
    }

    #[tokio::test]
    async fn test_establish_persists_and_publishes() {
        let (session, store) = manager();
        let mut rx = session.subscribe();

        let screen = session.establish(token("cashier01")).await.unwrap();

        assert_eq!(screen, Screen::Dashboard);
        assert!(session.is_authenticated().await);
        assert_eq!(session.identity().await.unwrap().username, "cashier01");

        let persisted = store.snapshot();
        assert!(persisted.token.is_some());
        assert_eq!(persisted.staff.unwrap().username, "cashier01");

        assert!(rx.has_changed().unwrap());
        assert!(matches!(*rx.borrow_and_update(), SessionState::Authenticated(_)));
    }

    #[tokio::test]
    async fn test_malformed_token_keeps_state() {
        let (session, store) = manager();
        let err = session
            .establish(SecretString::from("opaque-token"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::MalformedToken(_)));
        assert!(!session.is_authenticated().await);
        assert_eq!(store.snapshot(), PersistedSession::default());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (session, store) = manager();
        session.establish(token("cashier01")).await.unwrap();

        assert_eq!(session.logout().await, Screen::Login);
        assert!(!session.is_authenticated().await);
        assert!(session.token().await.is_none());
        assert_eq!(store.snapshot(), PersistedSession::default());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_expire_only_ends_matching_token() {
        let (session, _) = manager();
        let old = token("first");
        session.establish(old.clone()).await.unwrap();
        session.establish(token("second")).await.unwrap();

        assert_eq!(session.expire(&old).await, Screen::Dashboard);
        assert!(session.is_authenticated().await);

        let held = session.token().await.unwrap();
        assert_eq!(session.expire(&held).await, Screen::Login);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_restore_from_store() {
        let raw = claims::encode_unsigned("admin", StaffRole::Admin, Some(1_900_000_000));
        let store = MemorySessionStore::with_session(PersistedSession {
            token: Some(raw),
            staff: Some(StaffIdentity {
                username: "admin".to_string(),
                role: StaffRole::Admin,
            }),
        });

        let session = SessionManager::restore(store);
        assert!(session.is_authenticated().await);
        assert_eq!(session.identity().await.unwrap().role, StaffRole::Admin);
        assert!(session.expires_at().await.is_some());
    }

    #[tokio::test]
    async fn test_restore_discards_half_a_session() {
        let store = Arc::new(MemorySessionStore::with_session(PersistedSession {
            token: Some("h.p.s".to_string()),
            staff: None,
        }));

        let session = SessionManager::restore(Arc::clone(&store));
        assert!(!session.is_authenticated().await);
        assert_eq!(store.snapshot(), PersistedSession::default());
    }

    /// Memory store that lingers in `save` so overlapping calls interleave.
    #[derive(Default)]
    struct SlowStore(MemorySessionStore);

    impl SessionStore for SlowStore {
        fn load(&self) -> Result<PersistedSession, StoreError> {
            self.0.load()
        }

        fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
            std::thread::sleep(std::time::Duration::from_millis(5));
            self.0.save(session)
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.0.clear()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_logins_persist_the_held_token() {
        let store = Arc::new(SlowStore::default());
        let session = Arc::new(SessionManager::restore(Arc::clone(&store)));

        let logins: Vec<_> = (0..8)
            .map(|i| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.establish(token(&format!("staff{i}"))).await })
            })
            .collect();
        for login in logins {
            login.await.unwrap().unwrap();
        }

        let held = session.token().await.unwrap();
        let persisted = store.load().unwrap();
        assert_eq!(persisted.token.as_deref(), Some(held.expose_secret()));
        assert_eq!(persisted.staff, session.identity().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stale_rejection_never_ends_a_newer_login() {
        for _ in 0..20 {
            let store = Arc::new(SlowStore::default());
            let session = Arc::new(SessionManager::restore(Arc::clone(&store)));
            let old = token("first");
            session.establish(old.clone()).await.unwrap();

            let rejecting = {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.expire(&old).await })
            };
            let relogin = {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.establish(token("second")).await })
            };
            rejecting.await.unwrap();
            relogin.await.unwrap().unwrap();

            assert_eq!(session.identity().await.unwrap().username, "second");
            assert_eq!(store.load().unwrap().staff.unwrap().username, "second");
        }
    }
}
