// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Startup order:
//!
//! 1. Build the token, password and API settings from the loaded config
//! 2. Load the policy engine when enabled (fatal on failure)
//! 3. Create the in-memory store and seed the bootstrap accounts
//! 4. Serve until SIGINT/SIGTERM, then drain within the shutdown timeout

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use campus_api::auth::{
    Algorithm, HasherConfig, PasswordHasher, PolicyEngine, TokenConfig,
};
use campus_api::{ApiConfig, ApiServer, AppState, CorsConfig};
use campus_config::{load_config, CampusConfig, TokenAlgorithm};
use campus_core::{Clock, MemoryStore, SystemClock, UserRepository};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// Config mapping
// =============================================================================

/// Builds the API server settings.
pub fn api_config(config: &CampusConfig) -> ApiConfig {
    let server = &config.server;
    let cors = CorsConfig {
        allowed_origins: server.cors.allowed_origins.clone(),
        allowed_methods: server.cors.allowed_methods.clone(),
        allow_credentials: server.cors.allow_credentials,
        max_age: server.cors.max_age.as_secs(),
    };

    ApiConfig::new()
        .with_host(server.host)
        .with_port(server.port)
        .with_cors(cors)
        .with_request_timeout(server.request_timeout)
        .with_shutdown_timeout(server.shutdown_timeout)
}

/// Builds the token codec settings.
pub fn token_config(config: &CampusConfig) -> BinResult<TokenConfig> {
    let tokens = &config.security.tokens;
    let access = tokens
        .access
        .secret
        .as_ref()
        .ok_or_else(|| BinError::config("security.tokens.access.secret is not set"))?;
    let refresh = tokens
        .refresh
        .secret
        .as_ref()
        .ok_or_else(|| BinError::config("security.tokens.refresh.secret is not set"))?;

    Ok(TokenConfig::new(access.raw(), refresh.raw())
        .with_issuer(tokens.issuer.clone())
        .with_algorithm(algorithm(tokens.algorithm))
        .with_access_lifetime(tokens.access_lifetime())
        .with_refresh_lifetime(tokens.refresh_lifetime()))
}

fn algorithm(algorithm: TokenAlgorithm) -> Algorithm {
    match algorithm {
        TokenAlgorithm::HS256 => Algorithm::HS256,
        TokenAlgorithm::HS384 => Algorithm::HS384,
        TokenAlgorithm::HS512 => Algorithm::HS512,
        TokenAlgorithm::RS256 => Algorithm::RS256,
        TokenAlgorithm::ES256 => Algorithm::ES256,
    }
}

/// Builds the Argon2 cost parameters.
pub fn hasher_config(config: &CampusConfig) -> HasherConfig {
    let password = &config.security.password;
    HasherConfig {
        memory_kib: password.memory_kib,
        iterations: password.iterations,
        parallelism: password.parallelism,
    }
}

/// Loads the policy engine, or `None` when it is disabled.
pub async fn load_policy(config: &CampusConfig) -> BinResult<Option<Arc<PolicyEngine>>> {
    if !config.policy.enabled {
        info!("Policy engine disabled; role allow-lists only");
        return Ok(None);
    }
    let (model_path, policy_path) = config
        .policy
        .paths()
        .ok_or_else(|| BinError::policy("policy.model_path and policy.policy_path are required"))?;

    let engine = PolicyEngine::from_files(model_path, policy_path).await?;
    info!(
        model = %model_path.display(),
        policy = %policy_path.display(),
        rules = engine.rules().await.len(),
        "Policy engine loaded"
    );
    Ok(Some(Arc::new(engine)))
}

/// Inserts the bootstrap accounts. Returns the number created.
pub async fn seed_accounts(store: &MemoryStore, config: &CampusConfig) -> BinResult<usize> {
    for account in &config.accounts {
        let user = store.create_user(account.to_new_user()?).await?;
        info!(username = %user.username, role = %user.role, "Seeded account");
    }
    Ok(config.accounts.len())
}

// =============================================================================
// CampusRuntime
// =============================================================================

/// Owns the loaded configuration and runs the service.
pub struct CampusRuntime {
    config: Arc<CampusConfig>,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownCoordinator,
}

impl CampusRuntime {
    /// Creates a new runtime using the system clock.
    pub fn new(config: CampusConfig) -> Self {
        Self {
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CampusConfig {
        &self.config
    }

    /// Returns a handle that can stop the running service.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Builds the shared application state, including seeded accounts.
    pub async fn build_state(&self) -> BinResult<AppState> {
        let config = &self.config;
        let hasher = PasswordHasher::new(hasher_config(config))?;
        let policy = load_policy(config).await?;

        let store = Arc::new(MemoryStore::with_clock(self.clock.clone()));
        let seeded = seed_accounts(&store, config).await?;

        let mut builder = AppState::builder()
            .config(api_config(config))
            .store(store)
            .token_config(token_config(config)?)
            .hasher(hasher)
            .clock(self.clock.clone());
        if let Some(engine) = policy {
            builder = builder.policy(engine);
        }
        let state = builder.build()?;

        info!(accounts = seeded, "Application state ready");
        Ok(state)
    }

    /// Runs the service until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting campus v{}", campus_api::VERSION);
        for warning in self.config.warnings() {
            warn!("{}", warning);
        }

        let state = self.build_state().await?;
        let server = ApiServer::new(state);
        let grace = self.config.server.shutdown_timeout;
        info!(addr = %server.addr(), "Campus API is ready");

        let mut handle = tokio::spawn(server.run_with_shutdown(self.shutdown.shutdown_signal()));

        tokio::select! {
            finished = &mut handle => {
                // The server stopped before any shutdown request, e.g. bind failure.
                return flatten(finished);
            }
            _ = self.shutdown.wait_for_shutdown() => {}
        }

        info!(grace_secs = grace.as_secs(), "Draining in-flight requests");
        let result = match tokio::time::timeout(grace, handle).await {
            Ok(finished) => flatten(finished),
            Err(_) => {
                warn!("Graceful shutdown timed out; dropping remaining connections");
                Ok(())
            }
        };

        info!("Campus shutdown complete");
        result
    }
}

fn flatten(
    finished: Result<campus_api::ApiResult<()>, tokio::task::JoinError>,
) -> BinResult<()> {
    match finished {
        Ok(result) => result.map_err(BinError::from),
        Err(e) => Err(BinError::runtime(format!("Server task failed: {}", e))),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<CampusConfig>,
    clock: Option<Arc<dyn Clock>>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: CampusConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<CampusRuntime> {
        let config = match self.config {
            Some(cfg) => {
                cfg.validate()?;
                cfg
            }
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                load_config(&path)
                    .map_err(|e| BinError::from(e).with_context(format!("loading {}", path.display())))?
            }
        };

        let mut runtime = CampusRuntime::new(config);
        if let Some(clock) = self.clock {
            runtime = runtime.with_clock(clock);
        }
        Ok(runtime)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use campus_config::{AccountConfig, SecretValue};
    use campus_core::{CredentialStore, Role};
    use std::io::Write;
    use std::time::Duration;

    fn test_config() -> CampusConfig {
        let mut config = CampusConfig::default();
        config.security.tokens.access.secret =
            Some(SecretValue::new("runtime-access-secret-0123456789abcdef"));
        config.security.tokens.refresh.secret =
            Some(SecretValue::new("runtime-refresh-secret-0123456789abcdef"));
        config.security.password.memory_kib = 8;
        config.security.password.iterations = 1;
        config
    }

    fn account(username: &str, role: &str) -> AccountConfig {
        let hash = PasswordHasher::for_testing().hash("pw").unwrap();
        AccountConfig {
            username: username.to_string(),
            password_hash: hash,
            role: role.to_string(),
            firstname: None,
            lastname: None,
            email: None,
        }
    }

    #[test]
    fn test_token_config_mapping() {
        let mut config = test_config();
        config.security.tokens.access.lifetime = Some(Duration::from_secs(600));
        config.security.tokens.algorithm = TokenAlgorithm::HS512;

        let tokens = token_config(&config).unwrap();
        assert_eq!(tokens.algorithm, Algorithm::HS512);
        assert_eq!(tokens.access.lifetime, Duration::from_secs(600));
        assert_eq!(tokens.refresh.lifetime, Duration::from_secs(7 * 86400));
        assert_eq!(tokens.issuer, "campus");
    }

    #[test]
    fn test_api_config_mapping() {
        let mut config = test_config();
        config.server.port = 9100;
        config.server.cors.allowed_origins = vec!["https://campus.example".to_string()];

        let api = api_config(&config);
        assert_eq!(api.port, 9100);
        assert_eq!(api.cors.allowed_origins, vec!["https://campus.example"]);
        assert_eq!(api.cors.max_age, 3600);
    }

    #[tokio::test]
    async fn test_policy_disabled() {
        assert!(load_policy(&test_config()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_policy_load_failure_exit_code() {
        let mut config = test_config();
        config.policy.enabled = true;
        config.policy.model_path = Some(PathBuf::from("/nonexistent/model.conf"));
        config.policy.policy_path = Some(PathBuf::from("/nonexistent/policy.csv"));

        let err = load_policy(&config).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_policy_loads_from_files() {
        let mut model = tempfile::NamedTempFile::with_suffix(".conf").unwrap();
        model
            .write_all(campus_api::auth::policy::DEFAULT_MODEL.as_bytes())
            .unwrap();
        let mut policy = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        policy.write_all(b"p, admin, /users, GET\n").unwrap();

        let mut config = test_config();
        config.policy.enabled = true;
        config.policy.model_path = Some(model.path().to_path_buf());
        config.policy.policy_path = Some(policy.path().to_path_buf());

        let engine = load_policy(&config).await.unwrap().unwrap();
        assert!(engine.enforce("admin", "/users", "GET").await);
    }

    #[tokio::test]
    async fn test_build_state_seeds_accounts() {
        let mut config = test_config();
        config.accounts.push(account("root", "admin"));
        config.accounts.push(account("alice", "teacher"));

        let runtime = RuntimeBuilder::new().config(config).build().unwrap();
        let state = runtime.build_state().await.unwrap();

        let alice = state.store().get_by_username("alice").await.unwrap();
        assert_eq!(alice.role, Role::Teacher);
        assert!(state.policy().is_none());
    }

    #[test]
    fn test_runtime_builder_requires_config() {
        let result = RuntimeBuilder::new().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_runtime_builder_validates_direct_config() {
        let result = RuntimeBuilder::new().config(CampusConfig::default()).build();
        assert!(matches!(result, Err(BinError::Config(_))));
    }
}
