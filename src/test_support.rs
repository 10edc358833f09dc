// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! In-process mock marketplace server for exercising the real dispatcher
//! over real HTTP.
//!
//! Every request is counted per path before routing, so tests can assert
//! the zero-network-call properties. Seeded data: module 7 (price 15),
//! module 3 (price 10, three scenarios in a deliberately unsorted order).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

const CUSTOMER_TOKEN: &str = "tok-customer";
const PROVIDER_TOKEN: &str = "tok-provider";

struct MockState {
    calls: Mutex<HashMap<String, usize>>,
    credits: Mutex<u64>,
    module_prices: Mutex<HashMap<i64, u64>>,
    provider_modules: Mutex<Vec<Value>>,
    fail_next: Mutex<Option<u16>>,
    ask_delay_ms: AtomicU64,
    next_id: AtomicI64,
}

impl MockState {
    fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            credits: Mutex::new(0),
            module_prices: Mutex::new(HashMap::from([(7, 15), (3, 10)])),
            provider_modules: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            ask_delay_ms: AtomicU64::new(0),
            next_id: AtomicI64::new(100),
        }
    }
}

/// Handle to a running mock server.
pub struct MockServer {
    base_url: Url,
    state: Arc<MockState>,
}

impl MockServer {
    /// Bind an ephemeral port and serve the mock marketplace.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::new());
        let router = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve mock");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}")).expect("mock base url"),
            state,
        }
    }

    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Requests seen for an exact path.
    pub fn call_count(&self, path: &str) -> usize {
        *self.state.calls.lock().unwrap().get(path).unwrap_or(&0)
    }

    /// Requests seen in total.
    pub fn total_calls(&self) -> usize {
        self.state.calls.lock().unwrap().values().sum()
    }

    /// Set the authoritative wallet balance.
    pub fn set_credits(&self, credits: u64) {
        *self.state.credits.lock().unwrap() = credits;
    }

    /// Make the next request fail with the given status.
    pub fn fail_next_with(&self, status: u16) {
        *self.state.fail_next.lock().unwrap() = Some(status);
    }

    /// Delay `/ai/ask` responses, for in-flight serialization tests.
    pub fn set_ask_delay_ms(&self, ms: u64) {
        self.state.ask_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Token the mock accepts for the seeded customer account.
    pub fn customer_token(&self) -> String {
        CUSTOMER_TOKEN.to_string()
    }

    /// Token the mock accepts for the seeded provider account.
    pub fn provider_token(&self) -> String {
        PROVIDER_TOKEN.to_string()
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/echo/auth", get(echo_auth))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/catalog/modules", get(catalog))
        .route("/wallet/balance", get(balance))
        .route("/wallet/topup", post(topup))
        .route("/purchase/{module_id}", post(purchase))
        .route("/provider/modules", get(provider_modules).post(create_module))
        .route("/provider/modules/{module_id}/scenarios", post(create_scenario))
        .route("/train/{module_id}/scenarios", get(scenarios))
        .route("/train/attempt", post(attempt))
        .route("/ai/ask", post(ask))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            count_and_maybe_fail,
        ))
        .with_state(state)
}

async fn count_and_maybe_fail(
    State(state): State<Arc<MockState>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    *state.calls.lock().unwrap().entry(path).or_insert(0) += 1;

    if let Some(code) = state.fail_next.lock().unwrap().take() {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({"detail": "induced failure"}))).into_response();
    }

    next.run(req).await
}

fn bearer(req_headers: &axum::http::HeaderMap) -> Option<&str> {
    req_headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn require_auth(headers: &axum::http::HeaderMap) -> Result<&str, Response> {
    match bearer(headers) {
        Some(token) if token == CUSTOMER_TOKEN || token == PROVIDER_TOKEN => Ok(token),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid or missing token"})),
        )
            .into_response()),
    }
}

fn require_provider(headers: &axum::http::HeaderMap) -> Result<(), Response> {
    let token = require_auth(headers)?;
    if token != PROVIDER_TOKEN {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Provider role required"})),
        )
            .into_response());
    }
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({"ok": true}))
}

async fn echo_auth(headers: axum::http::HeaderMap) -> Json<Value> {
    Json(json!({"authorized": bearer(&headers).is_some()}))
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if email.is_empty() || password != "hunter2" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Bad credentials"})),
        )
            .into_response();
    }
    Json(json!({"token": CUSTOMER_TOKEN, "role": "CUSTOMER"})).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let role = body["role"].as_str().unwrap_or("CUSTOMER");
    let token = if role == "PROVIDER" {
        PROVIDER_TOKEN
    } else {
        CUSTOMER_TOKEN
    };
    Json(json!({"token": token, "role": role})).into_response()
}

async fn catalog() -> Json<Value> {
    Json(json!([
        {
            "id": 7,
            "title": "Invoice fraud essentials",
            "description": "Spotting payment redirection lures",
            "price": 15,
            "provider_email": "provider@example.com"
        },
        {
            "id": 3,
            "title": "Spotting OTP scams",
            "description": "One-time codes and who may ask for them",
            "price": 10,
            "provider_email": "provider@example.com"
        }
    ]))
}

async fn balance(State(state): State<Arc<MockState>>, headers: axum::http::HeaderMap) -> Response {
    if let Err(rejection) = require_auth(&headers) {
        return rejection;
    }
    let credits = *state.credits.lock().unwrap();
    Json(json!({"credits": credits})).into_response()
}

async fn topup(
    State(state): State<Arc<MockState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = require_auth(&headers) {
        return rejection;
    }
    let amount = body["amount"].as_i64().unwrap_or(0);
    if amount <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "amount must be positive"})),
        )
            .into_response();
    }

    let mut credits = state.credits.lock().unwrap();
    *credits += amount as u64;
    Json(json!({"ok": true, "credits": *credits})).into_response()
}

async fn purchase(
    State(state): State<Arc<MockState>>,
    Path(module_id): Path<i64>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Err(rejection) = require_auth(&headers) {
        return rejection;
    }

    let price = match state.module_prices.lock().unwrap().get(&module_id) {
        Some(price) => *price,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": "Module not found"})),
            )
                .into_response();
        }
    };

    let mut credits = state.credits.lock().unwrap();
    if *credits < price {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Insufficient credits"})),
        )
            .into_response();
    }
    *credits -= price;
    Json(json!({"ok": true, "credits": *credits})).into_response()
}

async fn provider_modules(
    State(state): State<Arc<MockState>>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Err(rejection) = require_provider(&headers) {
        return rejection;
    }
    let modules = state.provider_modules.lock().unwrap().clone();
    Json(Value::Array(modules)).into_response()
}

async fn create_module(
    State(state): State<Arc<MockState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = require_provider(&headers) {
        return rejection;
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let price = body["price"].as_u64().unwrap_or(0);
    state.module_prices.lock().unwrap().insert(id, price);
    state.provider_modules.lock().unwrap().push(json!({
        "id": id,
        "title": body["title"],
        "description": body["description"],
        "price": price
    }));
    Json(json!({"id": id, "ok": true})).into_response()
}

async fn create_scenario(
    State(state): State<Arc<MockState>>,
    Path(module_id): Path<i64>,
    headers: axum::http::HeaderMap,
    Json(_body): Json<Value>,
) -> Response {
    if let Err(rejection) = require_provider(&headers) {
        return rejection;
    }
    if !state.module_prices.lock().unwrap().contains_key(&module_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Module not found"})),
        )
            .into_response();
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    Json(json!({"id": id, "ok": true})).into_response()
}

async fn scenarios(Path(module_id): Path<i64>) -> Json<Value> {
    // Module 3 carries the seeded list, deliberately unsorted by id so order
    // preservation is observable.
    if module_id == 3 {
        Json(json!([
            {"id": 9, "channel": "EMAIL", "prompt": "Your mailbox is full, click to upgrade"},
            {"id": 4, "channel": "SMS", "prompt": "Your bank: confirm this code now"},
            {"id": 11, "channel": "WEB", "prompt": "Login page with a lookalike domain"}
        ]))
    } else {
        Json(json!([]))
    }
}

async fn attempt(Json(body): Json<Value>) -> Response {
    let scenario_id = body["scenario_id"].as_i64().unwrap_or(0);
    let user_choice = body["user_choice"].as_u64().unwrap_or(0);

    let correct_choice = match scenario_id {
        9 | 11 => 1,
        4 => 0,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": "Scenario not found"})),
            )
                .into_response();
        }
    };
    Json(json!({"correct": user_choice == correct_choice})).into_response()
}

async fn ask(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let delay = state.ask_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    let question = body["question"].as_str().unwrap_or_default();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "question must not be empty"})),
        )
            .into_response();
    }
    Json(json!({"answer": "Look for urgency cues and mismatched sender domains."}))
        .into_response()
}
