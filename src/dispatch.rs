// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! The single outbound request path.
//!
//! Every call from every client goes through [`Dispatcher`]: it resolves
//! the bearer credential from the session at send time, attaches it when
//! present, and classifies the outcome into the [`ClientError`] taxonomy.
//! The dispatcher performs no retries; retry policy belongs to callers.

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::auth::SessionManager;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Wraps every outbound HTTP call.
pub struct Dispatcher {
    http: Client,
    base_url: Url,
    session: Arc<SessionManager>,
}

impl Dispatcher {
    /// Build the dispatcher with the configured timeout.
    pub fn new(config: &ClientConfig, session: Arc<SessionManager>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::server(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            session,
        })
    }

    /// GET `path` and deserialize the 2xx payload.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    /// POST `body` as JSON to `path` and deserialize the 2xx payload.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// POST to `path` with an empty body and deserialize the 2xx payload.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(Method::POST, path, None::<&()>).await
    }

    async fn execute<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::validation(format!("invalid request path {path}: {e}")))?;

        let mut builder = self.http.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        // Send-time credential resolution: the session is consulted here,
        // after request construction and immediately before dispatch, so a
        // sign-out racing an in-flight call can neither supply an earlier
        // token nor strip a header already sent.
        if let Some(token) = self.session.bearer_token() {
            builder = builder.bearer_auth(token);
        }

        debug!(%method, path, "dispatching request");
        let response = builder.send().await.map_err(classify_transport)?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::server(format!("invalid response body: {e}")));
        }

        let detail = read_detail(response).await;
        warn!(%method, path, %status, "request rejected");
        Err(self.classify_status(status, detail))
    }

    fn classify_status(&self, status: StatusCode, detail: Option<String>) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => {
                self.session.handle_unauthorized();
                ClientError::AuthenticationRequired
            }
            StatusCode::FORBIDDEN => ClientError::AuthorizationDenied(
                detail.unwrap_or_else(|| "operation not permitted for this role".to_string()),
            ),
            StatusCode::NOT_FOUND => {
                ClientError::NotFound(detail.unwrap_or_else(|| "resource not found".to_string()))
            }
            s if s.is_client_error() => ClientError::Validation(
                detail.unwrap_or_else(|| "request rejected by server".to_string()),
            ),
            s => ClientError::Server(detail.unwrap_or_else(|| format!("HTTP {s}"))),
        }
    }
}

/// Map a transport-level failure. Everything that never produced a status
/// line is `NetworkUnavailable`, so callers can distinguish "retry now"
/// from a server-side failure.
fn classify_transport(e: reqwest::Error) -> ClientError {
    if e.is_builder() {
        ClientError::validation(format!("malformed request: {e}"))
    } else if e.is_timeout() {
        ClientError::network("request timed out")
    } else {
        ClientError::network(e.to_string())
    }
}

/// Extract the server's `detail` message from an error body, if present.
async fn read_detail(response: reqwest::Response) -> Option<String> {
    let value: serde_json::Value = response.json().await.ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{Role, SessionManager, SessionStatus, TokenStore};
    use crate::models::HealthResponse;
    use crate::storage::MemorySecureStore;
    use crate::test_support::MockServer;

    async fn dispatcher_against(mock: &MockServer) -> (Dispatcher, Arc<SessionManager>) {
        let tokens = TokenStore::new(Arc::new(MemorySecureStore::new()), false).unwrap();
        let session = Arc::new(SessionManager::new(tokens, true).unwrap());
        let config = ClientConfig::default().with_base_url(mock.base_url());
        let dispatcher = Dispatcher::new(&config, Arc::clone(&session)).unwrap();
        (dispatcher, session)
    }

    #[tokio::test]
    async fn success_payload_passes_through() {
        let mock = MockServer::spawn().await;
        let (dispatcher, _) = dispatcher_against(&mock).await;

        let health: HealthResponse = dispatcher.get("/health").await.unwrap();
        assert!(health.ok);
    }

    #[tokio::test]
    async fn unauthorized_maps_and_invalidates_session() {
        let mock = MockServer::spawn().await;
        let (dispatcher, session) = dispatcher_against(&mock).await;
        session.sign_in("stale-token", Role::Customer).unwrap();

        let err = dispatcher
            .get::<crate::models::WalletBalance>("/wallet/balance")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AuthenticationRequired));
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn forbidden_maps_without_session_transition() {
        let mock = MockServer::spawn().await;
        let (dispatcher, session) = dispatcher_against(&mock).await;
        session
            .sign_in(mock.customer_token(), Role::Customer)
            .unwrap();

        let err = dispatcher
            .get::<Vec<crate::models::Module>>("/provider/modules")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AuthorizationDenied(_)));
        assert_eq!(session.status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn not_found_maps_with_detail() {
        let mock = MockServer::spawn().await;
        let (dispatcher, session) = dispatcher_against(&mock).await;
        session
            .sign_in(mock.customer_token(), Role::Customer)
            .unwrap();

        let err = dispatcher
            .post_empty::<crate::models::WalletMutationResponse>("/purchase/999")
            .await
            .unwrap_err();
        match err {
            ClientError::NotFound(detail) => assert_eq!(detail, "Module not found"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_error_detail_becomes_validation_message() {
        let mock = MockServer::spawn().await;
        let (dispatcher, session) = dispatcher_against(&mock).await;
        session
            .sign_in(mock.customer_token(), Role::Customer)
            .unwrap();

        // Straight to the wire, bypassing the wallet client's local check,
        // so the server's detail message is what comes back.
        let err = dispatcher
            .post::<crate::models::WalletMutationResponse, _>(
                "/wallet/topup",
                &crate::models::TopupRequest { amount: 0 },
            )
            .await
            .unwrap_err();
        match err {
            ClientError::Validation(detail) => assert_eq!(detail, "amount must be positive"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_failure_maps_to_server_error() {
        let mock = MockServer::spawn().await;
        mock.fail_next_with(500);
        let (dispatcher, _) = dispatcher_against(&mock).await;

        let err = dispatcher.get::<HealthResponse>("/health").await.unwrap_err();
        assert!(matches!(err, ClientError::Server(_)));
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_network_unavailable() {
        let tokens = TokenStore::new(Arc::new(MemorySecureStore::new()), false).unwrap();
        let session = Arc::new(SessionManager::new(tokens, true).unwrap());
        // Nothing listens on port 9; connection is refused immediately.
        let config =
            ClientConfig::default().with_base_url(Url::parse("http://127.0.0.1:9").unwrap());
        let dispatcher = Dispatcher::new(&config, session).unwrap();

        let err = dispatcher.get::<HealthResponse>("/health").await.unwrap_err();
        assert!(matches!(err, ClientError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn credential_is_resolved_at_send_time() {
        let mock = MockServer::spawn().await;
        let (dispatcher, session) = dispatcher_against(&mock).await;

        session
            .sign_in(mock.customer_token(), Role::Customer)
            .unwrap();
        let seen: serde_json::Value = dispatcher.get("/echo/auth").await.unwrap();
        assert_eq!(seen["authorized"], true);

        // After sign-out the very same dispatcher must send unauthenticated.
        session.sign_out().unwrap();
        let seen: serde_json::Value = dispatcher.get("/echo/auth").await.unwrap();
        assert_eq!(seen["authorized"], false);
    }
}
