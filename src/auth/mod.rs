// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! # Authentication Module
//!
//! Client-side ownership of the bearer credential and session lifecycle.
//!
//! ## Session Flow
//!
//! 1. `AuthClient` posts credentials to `/auth/login` or `/auth/register`
//! 2. The server returns `{token, role}`
//! 3. [`SessionManager::sign_in`] stores both through [`TokenStore`] and
//!    publishes the authenticated session atomically
//! 4. The dispatcher resolves the token at send time for every call
//! 5. A 401 from any call invalidates the session exactly once (when the
//!    forced sign-out policy is enabled)
//!
//! ## Security
//!
//! - The token is opaque to the client; it is never decoded or verified here
//! - Sign-out is purely local: the store is cleared, no server call is made
//! - [`Role`] is a UI-gating hint only; the server's 403 is authoritative

pub mod roles;
pub mod session;
pub mod token_store;

pub use roles::Role;
pub use session::{Session, SessionManager, SessionStatus};
pub use token_store::{StoredCredential, TokenStore};
