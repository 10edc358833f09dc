// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Register, login and sign-out: the network half of the session lifecycle.

use std::sync::Arc;

use crate::auth::{Role, SessionManager};
use crate::dispatch::Dispatcher;
use crate::error::{ClientError, ClientResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};

/// Drives the session state machine against the auth endpoints.
pub struct AuthClient {
    dispatcher: Arc<Dispatcher>,
    session: Arc<SessionManager>,
}

impl AuthClient {
    pub fn new(dispatcher: Arc<Dispatcher>, session: Arc<SessionManager>) -> Self {
        Self {
            dispatcher,
            session,
        }
    }

    /// Create an account and sign in with the returned credential.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> ClientResult<Role> {
        validate_credentials(email, password)?;

        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        self.attempt("/auth/register", &request).await
    }

    /// Sign in to an existing account.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Role> {
        validate_credentials(email, password)?;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.attempt("/auth/login", &request).await
    }

    /// Sign out. Purely local: clears the stored credential and session.
    pub fn sign_out(&self) -> ClientResult<()> {
        self.session.sign_out()?;
        Ok(())
    }

    async fn attempt<B: serde::Serialize>(&self, path: &str, body: &B) -> ClientResult<Role> {
        self.session.begin_sign_in();

        match self.dispatcher.post::<AuthResponse, _>(path, body).await {
            Ok(auth) => {
                self.session.sign_in(auth.token, auth.role)?;
                Ok(auth.role)
            }
            Err(e) => {
                self.session.fail_sign_in();
                Err(e)
            }
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> ClientResult<()> {
    if email.trim().is_empty() {
        return Err(ClientError::validation("email must not be empty"));
    }
    if password.is_empty() {
        return Err(ClientError::validation("password must not be empty"));
    }
    Ok(())
}
