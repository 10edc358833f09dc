// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Wallet operations and the cached-credit consistency contract.
//!
//! The server is authoritative for the balance. The client keeps the last
//! server-confirmed value (or the conservative default 0 while anonymous)
//! and reconciles it from every mutating response; it never computes a
//! balance by local arithmetic. The pre-purchase check is advisory: it
//! saves a round trip, it does not guarantee success.

use std::sync::{Arc, Mutex};

use crate::auth::SessionManager;
use crate::dispatch::Dispatcher;
use crate::error::{ClientError, ClientResult};
use crate::models::{ModuleId, TopupRequest, WalletBalance, WalletMutationResponse};

/// Balance query, top-up and purchase.
pub struct WalletClient {
    dispatcher: Arc<Dispatcher>,
    session: Arc<SessionManager>,
    cached: Mutex<u64>,
}

impl WalletClient {
    pub fn new(dispatcher: Arc<Dispatcher>, session: Arc<SessionManager>) -> Self {
        Self {
            dispatcher,
            session,
            cached: Mutex::new(0),
        }
    }

    /// Last server-confirmed balance (0 while anonymous).
    pub fn cached_credits(&self) -> u64 {
        *self.lock()
    }

    /// Fetch the balance.
    ///
    /// While anonymous this returns the conservative default without
    /// issuing a network call, so an anonymous session never floods the
    /// server with authentication failures.
    pub async fn balance(&self) -> ClientResult<WalletBalance> {
        if self.session.bearer_token().is_none() {
            *self.lock() = 0;
            return Ok(WalletBalance { credits: 0 });
        }

        let balance: WalletBalance = self.dispatcher.get("/wallet/balance").await?;
        *self.lock() = balance.credits;
        Ok(balance)
    }

    /// Add credits. Non-positive amounts are rejected locally.
    pub async fn topup(&self, amount: i64) -> ClientResult<WalletBalance> {
        if amount <= 0 {
            return Err(ClientError::validation("top-up amount must be positive"));
        }

        let response: WalletMutationResponse = self
            .dispatcher
            .post("/wallet/topup", &TopupRequest { amount })
            .await?;
        *self.lock() = response.credits;
        Ok(WalletBalance {
            credits: response.credits,
        })
    }

    /// Purchase a module.
    ///
    /// Fails fast with `InsufficientCredits` when the cached balance cannot
    /// cover `price`, issuing no network call. On success the cache adopts
    /// the server's post-deduction balance verbatim. Concurrent purchases
    /// for the same module are dispatched independently; at-most-once
    /// semantics are the server's.
    pub async fn purchase(&self, module_id: ModuleId, price: u64) -> ClientResult<WalletBalance> {
        let available = *self.lock();
        if available < price {
            return Err(ClientError::InsufficientCredits {
                available,
                required: price,
            });
        }

        let response: WalletMutationResponse = self
            .dispatcher
            .post_empty(&format!("/purchase/{module_id}"))
            .await?;
        *self.lock() = response.credits;
        Ok(WalletBalance {
            credits: response.credits,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.cached.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}
