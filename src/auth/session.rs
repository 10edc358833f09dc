// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Session state machine and change notifications.
//!
//! One [`SessionManager`] instance exists per running client. All state
//! transitions go through it; the dispatcher resolves the bearer token from
//! it at send time and reports 401s back to it.

use std::sync::RwLock;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::{Role, TokenStore};
use crate::storage::StoreResult;

/// Authentication lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No credential. The dispatcher sends unauthenticated.
    Anonymous,
    /// A sign-in attempt is in flight.
    Authenticating,
    /// A credential is installed.
    Authenticated,
}

/// The current session snapshot.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque bearer token, present only when authenticated.
    pub token: Option<String>,
    /// Role hint travelling with the token.
    pub role: Option<Role>,
    /// Lifecycle state.
    pub status: SessionStatus,
}

impl Session {
    fn anonymous() -> Self {
        Self {
            token: None,
            role: None,
            status: SessionStatus::Anonymous,
        }
    }
}

/// Owns authentication state.
///
/// Transitions:
///
/// ```text
/// Anonymous -> Authenticating -> { Authenticated | Anonymous }
/// Authenticated -> Anonymous        (sign-out, credential invalidated)
/// ```
///
/// Sign-in publishes the full session under one write lock, so no reader
/// observes a partially-updated session. Sign-out is purely local; it never
/// calls the server.
pub struct SessionManager {
    tokens: TokenStore,
    inner: RwLock<Session>,
    changes: watch::Sender<SessionStatus>,
    auto_sign_out: bool,
}

impl SessionManager {
    /// Build the manager over a token store.
    ///
    /// The initial state is `Authenticated` iff the store yields a
    /// credential (only possible when persistence is enabled), else
    /// `Anonymous`.
    ///
    /// `auto_sign_out` selects the 401 policy: when true, an authentication
    /// failure reported by the dispatcher forces a local sign-out.
    pub fn new(tokens: TokenStore, auto_sign_out: bool) -> StoreResult<Self> {
        let initial = match tokens.get()? {
            Some(cred) => Session {
                token: Some(cred.token),
                role: Some(cred.role),
                status: SessionStatus::Authenticated,
            },
            None => Session::anonymous(),
        };

        let (changes, _) = watch::channel(initial.status);
        Ok(Self {
            tokens,
            inner: RwLock::new(initial),
            changes,
            auto_sign_out,
        })
    }

    fn read(&self) -> Session {
        self.inner
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poison| poison.into_inner().clone())
    }

    fn publish(&self, session: Session) {
        let status = session.status;
        match self.inner.write() {
            Ok(mut guard) => *guard = session,
            Err(poison) => *poison.into_inner() = session,
        }
        // Notify only on an actual status transition.
        self.changes.send_if_modified(|current| {
            if *current != status {
                *current = status;
                true
            } else {
                false
            }
        });
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        self.read().status
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.read()
    }

    /// Role hint of the current session, if authenticated.
    pub fn role(&self) -> Option<Role> {
        self.read().role
    }

    /// Resolve the bearer token for an outbound call.
    ///
    /// This is the send-time resolution point: the dispatcher calls it
    /// immediately before dispatch, never earlier.
    pub fn bearer_token(&self) -> Option<String> {
        self.read().token
    }

    /// Subscribe to lifecycle transitions.
    ///
    /// A value is published only on an actual status change.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.changes.subscribe()
    }

    /// Enter `Authenticating` for the duration of a sign-in attempt.
    pub fn begin_sign_in(&self) {
        let mut session = Session::anonymous();
        session.status = SessionStatus::Authenticating;
        self.publish(session);
    }

    /// Abort an in-flight sign-in attempt, returning to `Anonymous`.
    pub fn fail_sign_in(&self) {
        if self.status() == SessionStatus::Authenticating {
            self.publish(Session::anonymous());
        }
    }

    /// Install a credential and transition to `Authenticated`.
    ///
    /// The credential is persisted through the token store before the
    /// session is published, so a reader can never observe an authenticated
    /// session whose credential the store does not hold.
    pub fn sign_in(&self, token: impl Into<String>, role: Role) -> StoreResult<()> {
        let token = token.into();

        if let Err(e) = self.tokens.set(token.clone(), role) {
            if self.status() == SessionStatus::Authenticating {
                self.publish(Session::anonymous());
            }
            return Err(e);
        }

        info!(role = %role, "session authenticated");
        self.publish(Session {
            token: Some(token),
            role: Some(role),
            status: SessionStatus::Authenticated,
        });
        Ok(())
    }

    /// Clear the credential and transition to `Anonymous`.
    ///
    /// Purely local: no server call is made, ever. The in-memory session is
    /// always cleared, even when removing the durable entries fails; the
    /// store error still surfaces to the caller.
    pub fn sign_out(&self) -> StoreResult<()> {
        let cleared = self.tokens.clear();
        info!("session signed out");
        self.publish(Session::anonymous());
        cleared
    }

    /// React to a 401 reported by the dispatcher.
    ///
    /// With the forced sign-out policy enabled, an `Authenticated` session
    /// transitions to `Anonymous` exactly once no matter how many concurrent
    /// calls observe the failure; later reports are no-ops. Returns whether
    /// this call performed the transition.
    pub fn handle_unauthorized(&self) -> bool {
        if !self.auto_sign_out {
            return false;
        }

        // Take the write lock up front so concurrent reports serialize and
        // only the first one observes `Authenticated`.
        let transitioned = {
            let mut guard = match self.inner.write() {
                Ok(guard) => guard,
                Err(poison) => poison.into_inner(),
            };
            if guard.status != SessionStatus::Authenticated {
                false
            } else {
                *guard = Session::anonymous();
                true
            }
        };

        if transitioned {
            if let Err(e) = self.tokens.clear() {
                warn!(error = %e, "failed to clear stored credential on forced sign-out");
            }
            warn!("credential rejected by server; session invalidated");
            self.changes.send_replace(SessionStatus::Anonymous);
        }
        transitioned
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemorySecureStore;

    fn manager(persist: bool, auto_sign_out: bool) -> SessionManager {
        let store = Arc::new(MemorySecureStore::new());
        let tokens = TokenStore::new(store, persist).unwrap();
        SessionManager::new(tokens, auto_sign_out).unwrap()
    }

    #[test]
    fn starts_anonymous_without_stored_credential() {
        let session = manager(false, true);
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(session.bearer_token().is_none());
    }

    #[test]
    fn starts_authenticated_when_persistence_yields_credential() {
        let store: Arc<MemorySecureStore> = Arc::new(MemorySecureStore::new());
        {
            let tokens = TokenStore::new(store.clone(), true).unwrap();
            tokens.set("tok-1", Role::Customer).unwrap();
        }

        let tokens = TokenStore::new(store, true).unwrap();
        let session = SessionManager::new(tokens, true).unwrap();
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.bearer_token().as_deref(), Some("tok-1"));
        assert_eq!(session.role(), Some(Role::Customer));
    }

    #[test]
    fn sign_in_publishes_token_and_role_together() {
        let session = manager(false, true);
        session.begin_sign_in();
        assert_eq!(session.status(), SessionStatus::Authenticating);

        session.sign_in("tok-2", Role::Provider).unwrap();

        let snapshot = session.current();
        assert_eq!(snapshot.status, SessionStatus::Authenticated);
        assert_eq!(snapshot.token.as_deref(), Some("tok-2"));
        assert_eq!(snapshot.role, Some(Role::Provider));
    }

    #[test]
    fn fail_sign_in_returns_to_anonymous() {
        let session = manager(false, true);
        session.begin_sign_in();
        session.fail_sign_in();
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn sign_out_clears_token_locally() {
        let session = manager(false, true);
        session.sign_in("tok-3", Role::Customer).unwrap();
        session.sign_out().unwrap();

        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(session.bearer_token().is_none());
    }

    #[test]
    fn unauthorized_invalidates_exactly_once() {
        let session = manager(false, true);
        session.sign_in("tok-4", Role::Customer).unwrap();

        let mut rx = session.subscribe();
        rx.mark_unchanged();

        assert!(session.handle_unauthorized());
        assert!(!session.handle_unauthorized());
        assert!(!session.handle_unauthorized());

        assert_eq!(session.status(), SessionStatus::Anonymous);

        // Exactly one change notification was published.
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionStatus::Anonymous);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn unauthorized_respects_disabled_policy() {
        let session = manager(false, false);
        session.sign_in("tok-5", Role::Customer).unwrap();

        assert!(!session.handle_unauthorized());
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.bearer_token().as_deref(), Some("tok-5"));
    }

    #[test]
    fn concurrent_unauthorized_reports_transition_once() {
        let session = Arc::new(manager(false, true));
        session.sign_in("tok-6", Role::Customer).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let session = Arc::clone(&session);
            handles.push(std::thread::spawn(move || session.handle_unauthorized()));
        }

        let transitions: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(transitions, 1);
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }
}
