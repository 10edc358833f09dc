// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Scenario retrieval and attempt submission.
//!
//! Correctness is decided server-side only: a client that could compute the
//! verdict locally could also spoof it, so the verdict is treated as opaque
//! and authoritative.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::dispatch::Dispatcher;
use crate::error::{ClientError, ClientResult};
use crate::models::{AttemptRequest, AttemptResponse, ModuleId, Scenario, ScenarioId};

/// Max number of module scenario lists kept hot.
const SCENARIO_CACHE_CAPACITY: usize = 16;

/// Time-to-live for a cached scenario list.
const SCENARIO_CACHE_TTL: Duration = Duration::from_secs(30);

/// Cached entry: server-ordered list + insertion timestamp.
struct CacheEntry {
    scenarios: Vec<Scenario>,
    inserted_at: Instant,
}

/// In-process LRU cache for the scenario list a trainee is working through.
///
/// Lists are stored and served in server order, never re-sorted.
struct ScenarioCache {
    cache: Mutex<LruCache<i64, CacheEntry>>,
    ttl: Duration,
}

impl ScenarioCache {
    fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    fn get(&self, module_id: ModuleId) -> Option<Vec<Scenario>> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(&module_id.0) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.scenarios.clone());
            }
            // Expired — remove it
            cache.pop(&module_id.0);
        }
        None
    }

    fn put(&self, module_id: ModuleId, scenarios: Vec<Scenario>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                module_id.0,
                CacheEntry {
                    scenarios,
                    inserted_at: Instant::now(),
                },
            );
        }
    }
}

/// Scenario retrieval and attempts.
pub struct TrainingClient {
    dispatcher: Arc<Dispatcher>,
    cache: ScenarioCache,
}

impl TrainingClient {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            cache: ScenarioCache::new(SCENARIO_CACHE_CAPACITY, SCENARIO_CACHE_TTL),
        }
    }

    /// Scenarios of a module, in server-defined order.
    ///
    /// A fresh cached list is served without a network call; the cache never
    /// reorders.
    pub async fn scenarios(&self, module_id: ModuleId) -> ClientResult<Vec<Scenario>> {
        if let Some(cached) = self.cache.get(module_id) {
            return Ok(cached);
        }

        let scenarios: Vec<Scenario> = self
            .dispatcher
            .get(&format!("/train/{module_id}/scenarios"))
            .await?;
        self.cache.put(module_id, scenarios.clone());
        Ok(scenarios)
    }

    /// Submit an answer and return the server's verdict.
    pub async fn attempt(&self, scenario_id: ScenarioId, user_choice: u8) -> ClientResult<bool> {
        if user_choice > 1 {
            return Err(ClientError::validation("choice must be 0 or 1"));
        }

        let response: AttemptResponse = self
            .dispatcher
            .post(
                "/train/attempt",
                &AttemptRequest {
                    scenario_id,
                    user_choice,
                },
            )
            .await?;
        Ok(response.correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, SessionManager, TokenStore};
    use crate::config::ClientConfig;
    use crate::storage::MemorySecureStore;
    use crate::test_support::MockServer;

    fn training_client(mock: &MockServer) -> TrainingClient {
        let tokens = TokenStore::new(Arc::new(MemorySecureStore::new()), false).unwrap();
        let session = Arc::new(SessionManager::new(tokens, true).unwrap());
        session
            .sign_in(mock.customer_token(), Role::Customer)
            .unwrap();
        let config = ClientConfig::default().with_base_url(mock.base_url());
        let dispatcher = Arc::new(Dispatcher::new(&config, session).unwrap());
        TrainingClient::new(dispatcher)
    }

    #[tokio::test]
    async fn scenarios_preserve_server_order() {
        let mock = MockServer::spawn().await;
        let training = training_client(&mock);

        let scenarios = training.scenarios(ModuleId(3)).await.unwrap();
        let ids: Vec<i64> = scenarios.iter().map(|s| s.id.0).collect();
        // The mock serves these deliberately unsorted.
        assert_eq!(ids, vec![9, 4, 11]);
    }

    #[tokio::test]
    async fn fresh_list_is_served_from_cache() {
        let mock = MockServer::spawn().await;
        let training = training_client(&mock);

        let first = training.scenarios(ModuleId(3)).await.unwrap();
        let second = training.scenarios(ModuleId(3)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.call_count("/train/3/scenarios"), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let mock = MockServer::spawn().await;
        let training = TrainingClient {
            cache: ScenarioCache::new(SCENARIO_CACHE_CAPACITY, Duration::from_millis(0)),
            ..training_client(&mock)
        };

        training.scenarios(ModuleId(3)).await.unwrap();
        training.scenarios(ModuleId(3)).await.unwrap();
        assert_eq!(mock.call_count("/train/3/scenarios"), 2);
    }

    #[tokio::test]
    async fn attempt_returns_opaque_verdict() {
        let mock = MockServer::spawn().await;
        let training = training_client(&mock);

        assert!(training.attempt(ScenarioId(9), 1).await.unwrap());
        assert!(!training.attempt(ScenarioId(9), 0).await.unwrap());
    }

    #[tokio::test]
    async fn out_of_range_choice_rejected_locally() {
        let mock = MockServer::spawn().await;
        let training = training_client(&mock);

        let err = training.attempt(ScenarioId(9), 2).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(mock.call_count("/train/attempt"), 0);
    }
}
