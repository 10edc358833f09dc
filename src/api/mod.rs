// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! # Top-level Clients
//!
//! The four marketplace surfaces plus authentication, wired together by
//! [`PhishGuardClient`] over one shared session and dispatcher. Each client
//! is independently usable behind `Arc`; UI-triggered calls run as
//! independent tasks with no global serialization (the assistant serializes
//! only its own exchanges).

use std::sync::Arc;

use crate::auth::{SessionManager, TokenStore};
use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::error::ClientResult;
use crate::storage::{MemorySecureStore, RedbSecureStore, SecureStore, StoragePaths};

pub mod assistant;
pub mod auth;
pub mod catalog;
pub mod training;
pub mod wallet;

pub use assistant::AssistantClient;
pub use auth::AuthClient;
pub use catalog::CatalogClient;
pub use training::TrainingClient;
pub use wallet::WalletClient;

/// The assembled client runtime.
///
/// Construction wires the secure store, token store, session manager and
/// dispatcher once; every surface shares them.
pub struct PhishGuardClient {
    /// Register / login / sign-out.
    pub auth: AuthClient,
    /// Balance, top-up, purchase.
    pub wallet: WalletClient,
    /// Catalog browsing and provider authoring.
    pub catalog: CatalogClient,
    /// Scenario retrieval and attempts.
    pub training: TrainingClient,
    /// Conversational assistant.
    pub assistant: AssistantClient,
    session: Arc<SessionManager>,
    dispatcher: Arc<Dispatcher>,
}

impl PhishGuardClient {
    /// Build the full client from configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let store: Arc<dyn SecureStore> = if config.persist_across_restart {
            let paths = StoragePaths::new(&config.data_dir);
            Arc::new(RedbSecureStore::open(&paths.credentials_db())?)
        } else {
            Arc::new(MemorySecureStore::new())
        };

        let tokens = TokenStore::new(store, config.persist_across_restart)?;
        let session = Arc::new(SessionManager::new(
            tokens,
            config.auto_sign_out_on_unauthorized,
        )?);
        let dispatcher = Arc::new(Dispatcher::new(&config, Arc::clone(&session))?);

        Ok(Self {
            auth: AuthClient::new(Arc::clone(&dispatcher), Arc::clone(&session)),
            wallet: WalletClient::new(Arc::clone(&dispatcher), Arc::clone(&session)),
            catalog: CatalogClient::new(Arc::clone(&dispatcher), Arc::clone(&session)),
            training: TrainingClient::new(Arc::clone(&dispatcher)),
            assistant: AssistantClient::new(Arc::clone(&dispatcher)),
            session,
            dispatcher,
        })
    }

    /// The shared session manager (status queries, change subscriptions).
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Server liveness probe.
    pub async fn health(&self) -> ClientResult<bool> {
        let response: crate::models::HealthResponse = self.dispatcher.get("/health").await?;
        Ok(response.ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, SessionStatus};
    use crate::error::ClientError;
    use crate::models::{ModuleId, ScenarioId};
    use crate::test_support::MockServer;

    fn client_against(mock: &MockServer) -> PhishGuardClient {
        let config = ClientConfig::default().with_base_url(mock.base_url());
        PhishGuardClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn health_probe_round_trips() {
        let mock = MockServer::spawn().await;
        let client = client_against(&mock);
        assert!(client.health().await.unwrap());
    }

    /// The full marketplace walk: login, read an empty wallet, fail a
    /// purchase, top up, purchase, train.
    #[tokio::test]
    async fn customer_journey_end_to_end() {
        let mock = MockServer::spawn().await;
        let client = client_against(&mock);

        // Login with valid credentials yields a token and role.
        let role = client
            .auth
            .login("user@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(role, Role::Customer);
        assert_eq!(client.session().status(), SessionStatus::Authenticated);

        // The account's true balance is zero.
        let balance = client.wallet.balance().await.unwrap();
        assert_eq!(balance.credits, 0);

        // Purchasing module 7 (price 15) fails before any network call.
        let err = client
            .wallet
            .purchase(ModuleId(7), 15)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InsufficientCredits { .. }));

        // Top up, then the purchase succeeds and the server's deduction
        // is adopted verbatim.
        let balance = client.wallet.topup(20).await.unwrap();
        assert_eq!(balance.credits, 20);

        let balance = client.wallet.purchase(ModuleId(7), 15).await.unwrap();
        assert_eq!(balance.credits, 5);

        // Training: ordered scenarios, opaque verdict.
        let scenarios = client.training.scenarios(ModuleId(3)).await.unwrap();
        assert!(!scenarios.is_empty());

        let correct = client.training.attempt(ScenarioId(9), 1).await.unwrap();
        assert!(correct);
    }

    #[tokio::test]
    async fn persistent_client_restores_session_across_restart() {
        let mock = MockServer::spawn().await;
        let dir = tempfile::TempDir::new().unwrap();
        let config = ClientConfig {
            data_dir: dir.path().to_path_buf(),
            ..ClientConfig::default()
        }
        .with_base_url(mock.base_url())
        .with_persistence(true);

        {
            let client = PhishGuardClient::new(config.clone()).unwrap();
            client
                .auth
                .login("user@example.com", "hunter2")
                .await
                .unwrap();
        }

        // A second client over the same data dir models a process restart.
        let client = PhishGuardClient::new(config).unwrap();
        assert_eq!(client.session().status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn non_persistent_client_starts_anonymous_after_restart() {
        let mock = MockServer::spawn().await;
        let dir = tempfile::TempDir::new().unwrap();
        let config = ClientConfig {
            data_dir: dir.path().to_path_buf(),
            ..ClientConfig::default()
        }
        .with_base_url(mock.base_url());

        {
            let client = PhishGuardClient::new(config.clone()).unwrap();
            client
                .auth
                .login("user@example.com", "hunter2")
                .await
                .unwrap();
        }

        let client = PhishGuardClient::new(config).unwrap();
        assert_eq!(client.session().status(), SessionStatus::Anonymous);
    }
}
