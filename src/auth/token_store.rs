// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Bearer credential persistence with an in-memory cache.
//!
//! Two secure-store entries back a credential: the token itself and its
//! role tag. Presence of the *token* entry defines whether a credential
//! exists; the role tag is auxiliary and a credential with a missing or
//! unparsable role tag is treated as absent.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::Role;
use crate::storage::{SecureStore, StoreError, StoreResult};

/// Secure-store key holding the bearer token.
pub const TOKEN_KEY: &str = "phishguard_token";

/// Secure-store key holding the role tag.
pub const ROLE_KEY: &str = "phishguard_role";

/// A credential as held by the store: the opaque token plus its role tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// Opaque bearer token.
    pub token: String,
    /// Role tag travelling with the token.
    pub role: Role,
}

/// Owns the bearer credential: scoped secure-store access plus an in-memory
/// cache so readers never hit the store on the hot path.
///
/// The cache is primed once at construction and kept authoritative
/// in-process; every mutation goes through [`set`](Self::set) /
/// [`clear`](Self::clear), which write through to the store *before*
/// updating the cache so the two can never disagree about whether a
/// credential exists.
pub struct TokenStore {
    store: Arc<dyn SecureStore>,
    persist: bool,
    cached: Mutex<Option<StoredCredential>>,
}

impl TokenStore {
    /// Build a token store over the given secure store.
    ///
    /// With `persist` enabled the cache is primed from durable storage, so
    /// a credential written by a previous process is visible immediately.
    /// With `persist` disabled the store is never read or written and a
    /// fresh process always observes absence.
    pub fn new(store: Arc<dyn SecureStore>, persist: bool) -> StoreResult<Self> {
        let cached = if persist {
            Self::load_initial(store.as_ref())?
        } else {
            None
        };

        Ok(Self {
            store,
            persist,
            cached: Mutex::new(cached),
        })
    }

    fn load_initial(store: &dyn SecureStore) -> StoreResult<Option<StoredCredential>> {
        let Some(token) = store.get(TOKEN_KEY)? else {
            return Ok(None);
        };

        match store.get(ROLE_KEY)?.as_deref().and_then(Role::parse) {
            Some(role) => Ok(Some(StoredCredential { token, role })),
            None => {
                // Dangling token without a usable role tag: drop both rather
                // than guess a role.
                store.delete(TOKEN_KEY).ok();
                store.delete(ROLE_KEY).ok();
                Ok(None)
            }
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Option<StoredCredential>>> {
        self.cached
            .lock()
            .map_err(|_| StoreError::Backend("credential cache lock poisoned".to_string()))
    }

    /// The current credential, if any. Served from the cache.
    pub fn get(&self) -> StoreResult<Option<StoredCredential>> {
        Ok(self.lock()?.clone())
    }

    /// Store a credential, replacing any previous one.
    ///
    /// Writes through to durable storage first; if either entry fails to
    /// write, both are removed best-effort and the cache is left untouched.
    pub fn set(&self, token: impl Into<String>, role: Role) -> StoreResult<()> {
        let token = token.into();

        if self.persist {
            if let Err(e) = self
                .store
                .set(TOKEN_KEY, &token)
                .and_then(|_| self.store.set(ROLE_KEY, &role.to_string()))
            {
                self.store.delete(TOKEN_KEY).ok();
                self.store.delete(ROLE_KEY).ok();
                return Err(e);
            }
        }

        *self.lock()? = Some(StoredCredential { token, role });
        Ok(())
    }

    /// Remove the credential.
    ///
    /// The token entry is removed first; once it is gone the credential no
    /// longer exists durably and the cache is emptied even if removing the
    /// auxiliary role tag then fails.
    pub fn clear(&self) -> StoreResult<()> {
        if self.persist {
            self.store.delete(TOKEN_KEY)?;
            *self.lock()? = None;
            self.store.delete(ROLE_KEY)?;
        } else {
            *self.lock()? = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySecureStore;

    fn shared_store() -> Arc<dyn SecureStore> {
        Arc::new(MemorySecureStore::new())
    }

    #[test]
    fn set_then_get_round_trips() {
        let tokens = TokenStore::new(shared_store(), true).unwrap();
        tokens.set("tok-1", Role::Customer).unwrap();

        let cred = tokens.get().unwrap().unwrap();
        assert_eq!(cred.token, "tok-1");
        assert_eq!(cred.role, Role::Customer);
    }

    #[test]
    fn clear_removes_both_entries() {
        let store = shared_store();
        let tokens = TokenStore::new(Arc::clone(&store), true).unwrap();
        tokens.set("tok-1", Role::Provider).unwrap();
        tokens.clear().unwrap();

        assert!(tokens.get().unwrap().is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(ROLE_KEY).unwrap(), None);
    }

    #[test]
    fn persisted_credential_visible_to_new_instance() {
        let store = shared_store();
        {
            let tokens = TokenStore::new(Arc::clone(&store), true).unwrap();
            tokens.set("tok-1", Role::Customer).unwrap();
        }

        // A second instance over the same store models a process restart.
        let tokens = TokenStore::new(store, true).unwrap();
        let cred = tokens.get().unwrap().unwrap();
        assert_eq!(cred.token, "tok-1");
    }

    #[test]
    fn non_persistent_store_never_survives_restart() {
        let store = shared_store();
        {
            let tokens = TokenStore::new(Arc::clone(&store), false).unwrap();
            tokens.set("tok-1", Role::Customer).unwrap();
            assert!(tokens.get().unwrap().is_some());
        }

        let tokens = TokenStore::new(store, false).unwrap();
        assert!(tokens.get().unwrap().is_none());
    }

    #[test]
    fn non_persistent_store_writes_nothing_durable() {
        let store = shared_store();
        let tokens = TokenStore::new(Arc::clone(&store), false).unwrap();
        tokens.set("tok-1", Role::Customer).unwrap();

        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(ROLE_KEY).unwrap(), None);
    }

    #[test]
    fn dangling_token_without_role_is_treated_as_absent() {
        let store = shared_store();
        store.set(TOKEN_KEY, "orphan").unwrap();

        let tokens = TokenStore::new(Arc::clone(&store), true).unwrap();
        assert!(tokens.get().unwrap().is_none());
        // The orphaned entry was cleaned up.
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn unparsable_role_tag_is_treated_as_absent() {
        let store = shared_store();
        store.set(TOKEN_KEY, "tok-1").unwrap();
        store.set(ROLE_KEY, "SUPERUSER").unwrap();

        let tokens = TokenStore::new(store, true).unwrap();
        assert!(tokens.get().unwrap().is_none());
    }
}
