// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! User roles for UI gating.

use serde::{Deserialize, Serialize};

/// Account role, as issued by the server at registration.
///
/// ## Role Semantics
///
/// - `Customer` - browses the catalog, purchases modules, trains
/// - `Provider` - additionally authors modules and scenarios
///
/// The role travels with the credential and is a hint for gating UI
/// affordances only. Authoritative enforcement lives server-side; a role
/// mismatch surfaces as `AuthorizationDenied` on the call that hit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Trainee account (purchases and attempts modules).
    Customer,
    /// Authoring account (creates modules and scenarios).
    Provider,
}

impl Role {
    /// Whether the authoring surfaces should be offered in the UI.
    ///
    /// A hint only; the server still decides.
    pub fn can_author(&self) -> bool {
        matches!(self, Role::Provider)
    }

    /// Parse a role from its wire tag (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_uppercase().as_str() {
            "CUSTOMER" => Some(Role::Customer),
            "PROVIDER" => Some(Role::Provider),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "CUSTOMER"),
            Role::Provider => write!(f, "PROVIDER"),
        }
    }
}
