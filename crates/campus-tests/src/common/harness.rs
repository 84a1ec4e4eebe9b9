// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! An in-process API with a manual clock and seeded accounts.
//!
//! Requests go straight through the router with `tower::ServiceExt::oneshot`,
//! so no socket is bound and tests can run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use campus_api::auth::{PolicyEngine, TokenConfig, TokenPair};
use campus_api::{ApiServer, AppState};
use campus_core::{ManualClock, MemoryStore, User, UserRepository};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::builders::RequestBuilder;
use super::fixtures::{self, AccountFixture, AccountFixtures, POLICY_CSV, POLICY_MODEL};

// =============================================================================
// Test Response
// =============================================================================

/// A buffered response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Parsed JSON body, or `Null` when the body is empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.body.clone())
            .unwrap_or_else(|e| panic!("unexpected body {}: {}", self.body, e))
    }

    /// Returns `error.code` from an error body.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

// =============================================================================
// Test App
// =============================================================================

/// Configuration for [`TestApp`].
#[derive(Debug, Clone)]
pub struct TestAppConfig {
    /// Accounts inserted before the first request.
    pub accounts: Vec<AccountFixture>,
    /// Whether to enable the shipped policy.
    pub with_policy: bool,
    /// Token settings.
    pub tokens: TokenConfig,
}

impl Default for TestAppConfig {
    fn default() -> Self {
        Self {
            accounts: AccountFixtures::all(),
            with_policy: false,
            tokens: fixtures::token_config(),
        }
    }
}

impl TestAppConfig {
    /// Enables the shipped policy.
    pub fn with_policy(mut self) -> Self {
        self.with_policy = true;
        self
    }

    /// Replaces the token settings.
    pub fn with_tokens(mut self, tokens: TokenConfig) -> Self {
        self.tokens = tokens;
        self
    }

    /// Replaces the seeded accounts.
    pub fn with_accounts(mut self, accounts: Vec<AccountFixture>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Builds the app.
    pub async fn build(self) -> TestApp {
        TestApp::start(self).await
    }
}

/// A running in-process API.
pub struct TestApp {
    router: Router,
    state: AppState,
    clock: Arc<ManualClock>,
    store: Arc<MemoryStore>,
    users: HashMap<String, User>,
}

impl TestApp {
    /// Starts an app with every standard account and no policy engine.
    pub async fn new() -> Self {
        TestAppConfig::default().build().await
    }

    /// Starts an app with every standard account and the shipped policy.
    pub async fn with_policy() -> Self {
        TestAppConfig::default().with_policy().build().await
    }

    async fn start(config: TestAppConfig) -> Self {
        super::init_test_logging();

        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let hasher = fixtures::test_hasher();

        let mut users = HashMap::new();
        for account in &config.accounts {
            let user = store
                .create_user(account.to_new_user(&hasher))
                .await
                .expect("seeding failed");
            users.insert(user.username.clone(), user);
        }

        let mut builder = AppState::builder()
            .store(store.clone())
            .token_config(config.tokens)
            .hasher(hasher)
            .clock(clock.clone());
        if config.with_policy {
            let engine = PolicyEngine::from_strs(POLICY_MODEL, POLICY_CSV)
                .await
                .expect("shipped policy must parse");
            builder = builder.policy(Arc::new(engine));
        }
        let state = builder.build().expect("state must build");
        let router = ApiServer::new(state.clone()).router();

        Self {
            router,
            state,
            clock,
            store,
            users,
        }
    }

    /// Sends a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body must be readable");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    /// Sends a request built with [`RequestBuilder`].
    pub async fn call(&self, request: RequestBuilder) -> TestResponse {
        self.send(request.build()).await
    }

    /// Sends `POST /login`.
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.call(
            RequestBuilder::post("/login")
                .json(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Logs in as a fixture account and returns its tokens.
    pub async fn tokens_for(&self, account: &AccountFixture) -> TokenPair {
        let response = self.login(account.username, account.password).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "login as {} failed: {}",
            account.username,
            response.body
        );
        response.json()
    }

    /// Logs in as a fixture account and returns the access token.
    pub async fn access_token(&self, account: &AccountFixture) -> String {
        self.tokens_for(account).await.access_token
    }

    /// Sends `POST /refresh`.
    pub async fn refresh(&self, refresh_token: &str) -> TestResponse {
        self.call(RequestBuilder::post("/refresh").json(json!({ "refresh_token": refresh_token })))
            .await
    }

    /// Returns a seeded user.
    pub fn user(&self, username: &str) -> &User {
        self.users
            .get(username)
            .unwrap_or_else(|| panic!("no seeded user {username}"))
    }

    /// Moves the shared clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        self.clock.advance(by);
    }

    /// Returns the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}
