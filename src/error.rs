// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Typed failure taxonomy shared by every client.
//!
//! The dispatcher normalizes transport and HTTP outcomes into this enum so
//! calling code never branches on transport-specific detail. Local
//! validation (blank title, non-positive top-up, insufficient cached
//! credits) rejects with the same taxonomy before any network call.

use crate::storage::StoreError;

/// Client-side error taxonomy.
///
/// `NetworkUnavailable` is distinct from `Server` so callers can offer
/// "retry" versus "try later" guidance.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server rejected the credential (HTTP 401).
    #[error("authentication required")]
    AuthenticationRequired,

    /// The account's role does not permit this operation (HTTP 403).
    #[error("not permitted for this account: {0}")]
    AuthorizationDenied(String),

    /// The request was rejected before or by the server as invalid.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The cached balance cannot cover the purchase price.
    #[error("insufficient credits: have {available}, need {required}")]
    InsufficientCredits { available: u64, required: u64 },

    /// The requested entity does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The server could not be reached (timeout, refused, DNS).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The server failed (HTTP 5xx) or returned an unreadable payload.
    #[error("server error: {0}")]
    Server(String),

    /// The on-device credential store failed.
    #[error("credential store error: {0}")]
    Storage(#[from] StoreError),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        ClientError::Server(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        ClientError::NetworkUnavailable(message.into())
    }

    /// Whether retrying the same call unchanged could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkUnavailable(_) | ClientError::Server(_)
        )
    }
}

/// Result alias used across the client surface.
pub type ClientResult<T> = Result<T, ClientError>;
