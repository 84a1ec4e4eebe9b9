// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use campus_core::{Clock, CredentialStore, MemoryStore, Store, SystemClock};

use crate::auth::{
    Authenticator, HasherConfig, PasswordHasher, PolicyEngine, TokenCodec, TokenConfig,
};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Every component is injected. Nothing here is process-global, so tests can
/// run isolated instances side by side.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Backing store for every repository.
    pub store: Arc<dyn Store>,
    /// Login and refresh orchestration.
    pub authenticator: Arc<Authenticator>,
    /// Policy engine, when enabled.
    pub policy: Option<Arc<PolicyEngine>>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the store.
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Returns the authenticator.
    pub fn auth(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        self.authenticator.codec()
    }

    /// Returns the password hasher.
    pub fn hasher(&self) -> &PasswordHasher {
        self.authenticator.hasher()
    }

    /// Returns the policy engine if enabled.
    pub fn policy(&self) -> Option<&Arc<PolicyEngine>> {
        self.policy.as_ref()
    }

    /// Returns the clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator)
            .field("policy_enabled", &self.policy.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
///
/// Token configuration is required. The store defaults to an empty
/// [`MemoryStore`] on the builder's clock, and the clock to [`SystemClock`].
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    store: Option<(Arc<dyn Store>, Arc<dyn CredentialStore>)>,
    token_config: Option<TokenConfig>,
    codec: Option<TokenCodec>,
    hasher: Option<PasswordHasher>,
    policy: Option<Arc<PolicyEngine>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the store.
    pub fn store<S: Store + 'static>(mut self, store: Arc<S>) -> Self {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let store: Arc<dyn Store> = store;
        self.store = Some((store, credentials));
        self
    }

    /// Sets the token configuration. Ignored if a codec is given.
    pub fn token_config(mut self, config: TokenConfig) -> Self {
        self.token_config = Some(config);
        self
    }

    /// Sets a ready-made token codec.
    pub fn codec(mut self, codec: TokenCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the password hasher.
    pub fn hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Enables the policy engine.
    pub fn policy(mut self, engine: Arc<PolicyEngine>) -> Self {
        self.policy = Some(engine);
        self
    }

    /// Sets the clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the AppState.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let codec = match (self.codec, self.token_config) {
            (Some(codec), _) => codec,
            (None, Some(token_config)) => TokenCodec::new(token_config)?,
            (None, None) => return Err(ApiError::internal("token configuration is required")),
        };

        let hasher = match self.hasher {
            Some(hasher) => hasher,
            None => PasswordHasher::new(HasherConfig::default())?,
        };

        let (store, credentials) = self.store.unwrap_or_else(|| {
            let store = Arc::new(MemoryStore::with_clock(clock.clone()));
            let credentials: Arc<dyn CredentialStore> = store.clone();
            let store: Arc<dyn Store> = store;
            (store, credentials)
        });

        let authenticator = Arc::new(Authenticator::new(credentials, hasher, codec));

        Ok(AppState {
            config: Arc::new(config),
            store,
            authenticator,
            policy: self.policy,
            clock,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<Authenticator> {
    fn from_ref(state: &AppState) -> Self {
        state.authenticator.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::policy::DEFAULT_MODEL;
    use campus_core::ManualClock;

    #[test]
    fn test_app_state_builder() {
        let state = AppState::builder()
            .token_config(TokenConfig::for_testing())
            .hasher(PasswordHasher::for_testing())
            .build()
            .unwrap();

        assert!(state.policy().is_none());
        assert_eq!(state.codec().issuer(), "campus");
    }

    #[test]
    fn test_builder_requires_token_config() {
        let err = AppState::builder()
            .hasher(PasswordHasher::for_testing())
            .build()
            .unwrap_err();
        assert!(err.is_server_error());
    }

    #[test]
    fn test_builder_rejects_invalid_token_config() {
        let result = AppState::builder()
            .token_config(TokenConfig::new("same-secret", "same-secret"))
            .hasher(PasswordHasher::for_testing())
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_app_state_with_components() {
        let clock = Arc::new(ManualClock::starting_now());
        let engine = Arc::new(PolicyEngine::from_strs(DEFAULT_MODEL, "").await.unwrap());

        let state = AppState::builder()
            .token_config(TokenConfig::for_testing())
            .hasher(PasswordHasher::for_testing())
            .store(Arc::new(MemoryStore::with_clock(clock.clone())))
            .clock(clock.clone())
            .policy(engine)
            .build()
            .unwrap();

        assert!(state.policy().is_some());
        assert_eq!(state.clock().now(), clock.now());
    }
}
