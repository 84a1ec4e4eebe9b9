// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! - `test_sample_*`: the shipped `config/` directory
//! - `test_format_*`: YAML, TOML and JSON parsing
//! - `test_override_*`: environment overrides
//! - `test_validation_*`: rejected configurations

use std::fs;
use std::time::Duration;

use campus_api::auth::{PasswordHasher, PolicyEngine, TokenCodec, TokenConfig};
use campus_config::{
    load_config_str, CampusConfig, ConfigError, ConfigFormat, ConfigLoader, LogLevel,
};
use campus_core::Role;
use campus_tests::common::temp_test_dir;
use campus_tests::prelude::*;

/// Writes the shipped config directory into a temp dir and returns it.
fn sample_dir() -> tempfile::TempDir {
    let dir = temp_test_dir("campus_sample_");
    fs::write(dir.path().join("campus.yaml"), SAMPLE_CONFIG).unwrap();
    fs::write(dir.path().join("rbac_model.conf"), POLICY_MODEL).unwrap();
    fs::write(dir.path().join("rbac_policy.csv"), POLICY_CSV).unwrap();
    dir
}

fn set_secrets(prefix: &str) {
    std::env::set_var(format!("{prefix}_ACCESS_TOKEN_SECRET"), ACCESS_SECRET);
    std::env::set_var(format!("{prefix}_REFRESH_TOKEN_SECRET"), REFRESH_SECRET);
}

// =============================================================================
// Sample Configuration
// =============================================================================

#[test]
fn test_sample_requires_secrets() {
    let dir = sample_dir();
    let loader = ConfigLoader::new().with_env_prefix("CAMPUS_IT_SAMPLE_NO_SECRETS");

    let err = loader.load(dir.path().join("campus.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { .. }), "{err:?}");
}

#[tokio::test]
async fn test_sample_loads_with_env_secrets() {
    let prefix = "CAMPUS_IT_SAMPLE_WITH_SECRETS";
    set_secrets(prefix);
    let dir = sample_dir();

    let config = ConfigLoader::new()
        .with_env_prefix(prefix)
        .load(dir.path().join("campus.yaml"))
        .unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.security.tokens.access_lifetime(), Duration::from_secs(7200));
    assert_eq!(
        config.security.tokens.refresh_lifetime(),
        Duration::from_secs(7 * 86400)
    );
    assert!(config.accounts.is_empty());
    assert!(config.warnings().iter().any(|w| w.contains("account")));

    let (model, policy) = config.policy.paths().unwrap();
    assert!(model.starts_with(dir.path()));
    let engine = PolicyEngine::from_files(model, policy).await.unwrap();
    assert!(engine.enforce("teacher", "/students", "GET").await);
}

#[test]
fn test_sample_builds_a_token_codec() {
    let prefix = "CAMPUS_IT_SAMPLE_CODEC";
    set_secrets(prefix);
    let dir = sample_dir();
    let config = ConfigLoader::new()
        .with_env_prefix(prefix)
        .load(dir.path().join("campus.yaml"))
        .unwrap();

    let tokens = &config.security.tokens;
    let codec_config = TokenConfig::new(
        tokens.access.secret.as_ref().unwrap().raw(),
        tokens.refresh.secret.as_ref().unwrap().raw(),
    )
    .with_issuer(tokens.issuer.clone())
    .with_access_lifetime(tokens.access_lifetime())
    .with_refresh_lifetime(tokens.refresh_lifetime());
    assert!(TokenCodec::new(codec_config).is_ok());
}

// =============================================================================
// Formats
// =============================================================================

#[test]
fn test_format_yaml_minimal() {
    let config = load_config_str(&minimal_yaml(), ConfigFormat::Yaml).unwrap();
    assert_eq!(config.security.tokens.issuer, "campus");
    assert_eq!(config.logging.level, LogLevel::Info);
    assert!(!config.policy.enabled);
}

#[test]
fn test_format_toml() {
    let toml = format!(
        r#"
[server]
port = 9443
request_timeout = "5s"

[security.tokens.access]
secret = "{ACCESS_SECRET}"
lifetime = "30m"

[security.tokens.refresh]
secret = "{REFRESH_SECRET}"
lifetime = "1d"

[logging]
level = "warn"
format = "json"
"#
    );
    let config = load_config_str(&toml, ConfigFormat::Toml).unwrap();
    assert_eq!(config.server.port, 9443);
    assert_eq!(config.server.request_timeout, Duration::from_secs(5));
    assert_eq!(config.security.tokens.access_lifetime(), Duration::from_secs(1800));
    assert_eq!(config.logging.level, LogLevel::Warn);
}

#[test]
fn test_format_json() {
    let json = serde_json::json!({
        "security": {
            "tokens": {
                "algorithm": "HS512",
                "access": { "secret": ACCESS_SECRET },
                "refresh": { "secret": REFRESH_SECRET }
            }
        }
    })
    .to_string();
    let config = load_config_str(&json, ConfigFormat::Json).unwrap();
    assert_eq!(config.security.tokens.algorithm.as_str(), "HS512");
}

// =============================================================================
// Overrides
// =============================================================================

#[test]
fn test_override_port_and_lifetime() {
    let prefix = "CAMPUS_IT_OVERRIDE_PORT";
    std::env::set_var(format!("{prefix}_SERVER_PORT"), "9090");
    std::env::set_var(format!("{prefix}_ACCESS_TOKEN_LIFETIME"), "10m");

    let config = ConfigLoader::new()
        .with_env_prefix(prefix)
        .load_from_str(&minimal_yaml(), ConfigFormat::Yaml)
        .unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.security.tokens.access_lifetime(), Duration::from_secs(600));
}

#[test]
fn test_override_invalid_port() {
    let prefix = "CAMPUS_IT_OVERRIDE_BAD_PORT";
    std::env::set_var(format!("{prefix}_SERVER_PORT"), "not-a-port");

    let err = ConfigLoader::new()
        .with_env_prefix(prefix)
        .load_from_str(&minimal_yaml(), ConfigFormat::Yaml)
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { .. }), "{err:?}");
}

#[test]
fn test_override_lifetimes_still_validated() {
    let prefix = "CAMPUS_IT_OVERRIDE_LIFETIMES";
    std::env::set_var(format!("{prefix}_ACCESS_TOKEN_LIFETIME"), "8d");

    let err = ConfigLoader::new()
        .with_env_prefix(prefix)
        .load_from_str(&minimal_yaml(), ConfigFormat::Yaml)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }), "{err:?}");
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validation_shared_secret() {
    let yaml = format!(
        r#"
security:
  tokens:
    access:
      secret: "{ACCESS_SECRET}"
    refresh:
      secret: "{ACCESS_SECRET}"
"#
    );
    assert!(load_config_str(&yaml, ConfigFormat::Yaml).is_err());
}

#[test]
fn test_validation_asymmetric_algorithm() {
    let yaml = minimal_yaml().replace("tokens:", "tokens:\n    algorithm: RS256");
    assert!(load_config_str(&yaml, ConfigFormat::Yaml).is_err());
}

#[test]
fn test_validation_unknown_field() {
    let yaml = format!("{}\nserver:\n  prot: 8080\n", minimal_yaml());
    assert!(load_config_str(&yaml, ConfigFormat::Yaml).is_err());
}

#[test]
fn test_validation_policy_paths_required() {
    let yaml = format!("{}\npolicy:\n  enabled: true\n", minimal_yaml());
    assert!(load_config_str(&yaml, ConfigFormat::Yaml).is_err());
}

// =============================================================================
// Accounts
// =============================================================================

fn with_account(role: &str, hash: &str) -> String {
    format!(
        r#"{}
accounts:
  - username: root
    password_hash: "{hash}"
    role: {role}
"#,
        minimal_yaml()
    )
}

#[test]
fn test_accounts_convert_to_users() {
    let hash = PasswordHasher::for_testing().hash("root-password").unwrap();
    let config = load_config_str(&with_account("Admin", &hash), ConfigFormat::Yaml).unwrap();

    let user = config.accounts[0].to_new_user().unwrap();
    assert_eq!(user.username, "root");
    assert_eq!(user.role, Role::Admin);
    assert!(PasswordHasher::for_testing()
        .verify(&user.password_hash, "root-password")
        .unwrap());
}

#[test]
fn test_accounts_reject_plaintext_password() {
    assert!(load_config_str(&with_account("admin", "root-password"), ConfigFormat::Yaml).is_err());
}

#[test]
fn test_accounts_reject_unknown_role() {
    let hash = PasswordHasher::for_testing().hash("pw").unwrap();
    assert!(load_config_str(&with_account("dean", &hash), ConfigFormat::Yaml).is_err());
}

#[test]
fn test_redacted_config_hides_secrets() {
    let hash = PasswordHasher::for_testing().hash("pw").unwrap();
    let config: CampusConfig =
        load_config_str(&with_account("admin", &hash), ConfigFormat::Yaml).unwrap();

    let rendered = serde_json::to_string(&config.redacted()).unwrap();
    assert!(!rendered.contains(ACCESS_SECRET));
    assert!(!rendered.contains(REFRESH_SECRET));
    assert!(!rendered.contains(&hash));
    assert!(rendered.contains("***"));
}
