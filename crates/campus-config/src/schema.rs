// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for the campus service.
//!
//! # Schema Structure
//!
//! ```text
//! CampusConfig
//! ├── server: ServerConfig
//! │   └── cors: CorsConfig
//! ├── security: SecurityConfig
//! │   ├── tokens: TokensConfig
//! │   └── password: PasswordConfig
//! ├── policy: PolicyConfig
//! ├── accounts: Vec<AccountConfig>
//! └── logging: LoggingConfig
//! ```
//!
//! [`CampusConfig::validate`] rejects anything that would stop the service;
//! [`CampusConfig::warnings`] lists softer problems such as short secrets.
//!
//! Durations are written as humantime strings (`30s`, `2h`, `7d`).
//! Environment overrides also accept a bare number of seconds.

use crate::error::{ConfigError, ConfigResult};
use campus_core::{NewUser, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default access token lifetime (2 hours).
pub const DEFAULT_ACCESS_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Secrets shorter than this are accepted with a warning.
pub const MIN_SECRET_LEN: usize = 32;

/// Default token issuer.
pub const DEFAULT_ISSUER: &str = "campus";

const MASK: &str = "***";

// =============================================================================
// Root Configuration
// =============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampusConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Token and password settings.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Policy engine configuration.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Bootstrap accounts inserted at startup.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CampusConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.security.validate()?;
        self.policy.validate()?;

        let mut usernames = HashSet::new();
        for (index, account) in self.accounts.iter().enumerate() {
            account.validate(index)?;
            if !usernames.insert(account.username.as_str()) {
                return Err(ConfigError::validation(
                    format!("accounts[{}].username", index),
                    format!("duplicate username '{}'", account.username),
                ));
            }
        }

        self.logging.validate()?;
        Ok(())
    }

    /// Returns problems that do not prevent startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let tokens = &self.security.tokens;
        for (field, key) in [
            ("security.tokens.access.secret", &tokens.access),
            ("security.tokens.refresh.secret", &tokens.refresh),
        ] {
            if let Some(secret) = &key.secret {
                if !secret.is_empty() && secret.len() < MIN_SECRET_LEN {
                    warnings.push(format!(
                        "{} is shorter than {} bytes",
                        field, MIN_SECRET_LEN
                    ));
                }
            }
        }
        if self.server.cors.allow_credentials && self.server.cors.allows_any_origin() {
            warnings.push(
                "server.cors.allow_credentials is ignored while any origin is allowed".to_string(),
            );
        }
        if self.accounts.is_empty() {
            warnings.push("No bootstrap accounts configured".to_string());
        }
        warnings
    }

    /// Returns a copy with every secret and password hash masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let tokens = &mut config.security.tokens;
        for key in [&mut tokens.access, &mut tokens.refresh] {
            if key.secret.is_some() {
                key.secret = Some(SecretValue::new(MASK));
            }
        }
        for account in &mut config.accounts {
            account.password_hash = MASK.to_string();
        }
        config
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Grace period for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

impl ServerConfig {
    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "cannot be zero",
            ));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::validation(
                "server.shutdown_timeout",
                "cannot be zero",
            ));
        }
        self.cors.validate()
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_SERVER_PORT,
            request_timeout: default_request_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (use "*" for all).
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    #[serde(default = "default_methods")]
    pub allowed_methods: Vec<String>,

    /// Allow credentials. Ignored when any origin is allowed.
    #[serde(default)]
    pub allow_credentials: bool,

    /// Preflight cache lifetime.
    #[serde(default = "default_max_age", with = "humantime_serde")]
    pub max_age: Duration,
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_max_age() -> Duration {
    Duration::from_secs(3600)
}

impl CorsConfig {
    /// Validates the CORS configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.allowed_methods.is_empty() {
            return Err(ConfigError::validation(
                "server.cors.allowed_methods",
                "cannot be empty",
            ));
        }
        Ok(())
    }

    /// Returns `true` if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
            allowed_methods: default_methods(),
            allow_credentials: false,
            max_age: default_max_age(),
        }
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Token and password settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Token signing configuration.
    #[serde(default)]
    pub tokens: TokensConfig,

    /// Password hashing cost.
    #[serde(default)]
    pub password: PasswordConfig,
}

impl SecurityConfig {
    /// Validates the security configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.tokens.validate()?;
        self.password.validate()
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokensConfig {
    /// Issuer claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Signing algorithm.
    #[serde(default)]
    pub algorithm: TokenAlgorithm,

    /// Access token key.
    #[serde(default)]
    pub access: TokenKeyConfig,

    /// Refresh token key.
    #[serde(default)]
    pub refresh: TokenKeyConfig,
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

impl TokensConfig {
    /// Returns the access token lifetime, falling back to 2 hours.
    pub fn access_lifetime(&self) -> Duration {
        self.access.lifetime.unwrap_or(DEFAULT_ACCESS_LIFETIME)
    }

    /// Returns the refresh token lifetime, falling back to 7 days.
    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh.lifetime.unwrap_or(DEFAULT_REFRESH_LIFETIME)
    }

    /// Validates the token configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation(
                "security.tokens.issuer",
                "cannot be empty",
            ));
        }
        if !self.algorithm.is_hmac() {
            return Err(ConfigError::validation(
                "security.tokens.algorithm",
                format!("{} is not an HMAC algorithm", self.algorithm.as_str()),
            ));
        }

        let access = required_secret(&self.access, "security.tokens.access.secret")?;
        let refresh = required_secret(&self.refresh, "security.tokens.refresh.secret")?;
        if access.raw() == refresh.raw() {
            return Err(ConfigError::validation(
                "security.tokens.refresh.secret",
                "must differ from the access token secret",
            ));
        }

        let access_lifetime = self.access_lifetime();
        let refresh_lifetime = self.refresh_lifetime();
        if access_lifetime.is_zero() {
            return Err(ConfigError::validation(
                "security.tokens.access.lifetime",
                "cannot be zero",
            ));
        }
        if refresh_lifetime.is_zero() {
            return Err(ConfigError::validation(
                "security.tokens.refresh.lifetime",
                "cannot be zero",
            ));
        }
        if access_lifetime >= refresh_lifetime {
            return Err(ConfigError::validation(
                "security.tokens.access.lifetime",
                "must be shorter than the refresh token lifetime",
            ));
        }
        Ok(())
    }
}

fn required_secret<'a>(key: &'a TokenKeyConfig, field: &str) -> ConfigResult<&'a SecretValue> {
    match key.secret.as_ref() {
        Some(secret) if !secret.raw().trim().is_empty() => Ok(secret),
        _ => Err(ConfigError::missing_field(field)),
    }
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            algorithm: TokenAlgorithm::default(),
            access: TokenKeyConfig::default(),
            refresh: TokenKeyConfig::default(),
        }
    }
}

/// Secret and lifetime of one token kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenKeyConfig {
    /// Signing secret.
    #[serde(default)]
    pub secret: Option<SecretValue>,

    /// Token lifetime. The default depends on the token kind.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<Duration>,
}

/// Token signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenAlgorithm {
    /// HMAC using SHA-256.
    #[default]
    HS256,
    /// HMAC using SHA-384.
    HS384,
    /// HMAC using SHA-512.
    HS512,
    /// RSA using SHA-256.
    RS256,
    /// ECDSA using P-256.
    ES256,
}

impl TokenAlgorithm {
    /// Returns the algorithm name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenAlgorithm::HS256 => "HS256",
            TokenAlgorithm::HS384 => "HS384",
            TokenAlgorithm::HS512 => "HS512",
            TokenAlgorithm::RS256 => "RS256",
            TokenAlgorithm::ES256 => "ES256",
        }
    }

    /// Returns `true` for the HMAC family.
    pub fn is_hmac(&self) -> bool {
        matches!(
            self,
            TokenAlgorithm::HS256 | TokenAlgorithm::HS384 | TokenAlgorithm::HS512
        )
    }
}

impl FromStr for TokenAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(TokenAlgorithm::HS256),
            "HS384" => Ok(TokenAlgorithm::HS384),
            "HS512" => Ok(TokenAlgorithm::HS512),
            "RS256" => Ok(TokenAlgorithm::RS256),
            "ES256" => Ok(TokenAlgorithm::ES256),
            other => Err(ConfigError::validation(
                "security.tokens.algorithm",
                format!("unknown algorithm '{}'", other),
            )),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl PasswordConfig {
    /// Validates the hashing cost.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.iterations == 0 {
            return Err(ConfigError::validation(
                "security.password.iterations",
                "cannot be zero",
            ));
        }
        if self.parallelism == 0 {
            return Err(ConfigError::validation(
                "security.password.parallelism",
                "cannot be zero",
            ));
        }
        // Argon2 needs at least 8 KiB per lane.
        if self.memory_kib < 8 * self.parallelism {
            return Err(ConfigError::validation(
                "security.password.memory_kib",
                format!("must be at least {} KiB", 8 * self.parallelism),
            ));
        }
        Ok(())
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

// =============================================================================
// Policy Configuration
// =============================================================================

/// Policy engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Whether the policy engine is consulted on protected routes.
    #[serde(default)]
    pub enabled: bool,

    /// Model file. Relative paths resolve against the config file directory.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Policy rules file.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
}

impl PolicyConfig {
    /// Validates the policy configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.model_path.is_none() {
            return Err(ConfigError::missing_field("policy.model_path"));
        }
        if self.policy_path.is_none() {
            return Err(ConfigError::missing_field("policy.policy_path"));
        }
        Ok(())
    }

    /// Returns both paths when the engine is enabled and fully configured.
    pub fn paths(&self) -> Option<(&PathBuf, &PathBuf)> {
        if !self.enabled {
            return None;
        }
        Some((self.model_path.as_ref()?, self.policy_path.as_ref()?))
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// A bootstrap identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// Login name.
    pub username: String,

    /// Argon2 PHC string. Generate one with `campus hash-password`.
    pub password_hash: String,

    /// Role label.
    pub role: String,

    /// Given name.
    #[serde(default)]
    pub firstname: Option<String>,

    /// Family name.
    #[serde(default)]
    pub lastname: Option<String>,

    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

impl AccountConfig {
    /// Parses the role label.
    pub fn role(&self) -> ConfigResult<Role> {
        Role::from_str(&self.role).map_err(|e| ConfigError::validation("accounts.role", e.to_string()))
    }

    /// Converts the account into store input.
    pub fn to_new_user(&self) -> ConfigResult<NewUser> {
        let mut user = NewUser::new(&self.username, &self.password_hash, self.role()?);
        user.firstname = self.firstname.clone().unwrap_or_default();
        user.lastname = self.lastname.clone().unwrap_or_default();
        user.email = self.email.clone().unwrap_or_default();
        Ok(user)
    }

    fn validate(&self, index: usize) -> ConfigResult<()> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::validation(
                format!("accounts[{}].username", index),
                "cannot be empty",
            ));
        }
        if let Err(e) = Role::from_str(&self.role) {
            return Err(ConfigError::validation(
                format!("accounts[{}].role", index),
                e.to_string(),
            ));
        }
        if !looks_like_phc(&self.password_hash) {
            return Err(ConfigError::validation(
                format!("accounts[{}].password_hash", index),
                "must be an Argon2 PHC string",
            ));
        }
        Ok(())
    }
}

/// `$argon2id$v=19$m=...,t=...,p=...$salt$hash`
fn looks_like_phc(value: &str) -> bool {
    value.starts_with("$argon2") && value.split('$').filter(|s| !s.is_empty()).count() >= 4
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Validates the logging configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name, accepting `warning` as an alias.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Compact single-line text.
    Compact,
    /// JSON for log aggregation.
    Json,
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never prints itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw value.
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue({})", MASK)
    }
}

// =============================================================================
// Duration parsing
// =============================================================================

/// Parses a humantime duration string, or a bare number of seconds.
pub fn duration_from_str(raw: &str) -> ConfigResult<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw)
        .map_err(|e| ConfigError::serialization(format!("invalid duration '{}': {}", raw, e)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo";

    fn valid_config() -> CampusConfig {
        let mut config = CampusConfig::default();
        config.security.tokens.access.secret =
            Some(SecretValue::new("access-secret-0123456789abcdef-0123"));
        config.security.tokens.refresh.secret =
            Some(SecretValue::new("refresh-secret-0123456789abcdef-012"));
        config
    }

    fn account(role: &str) -> AccountConfig {
        AccountConfig {
            username: "alice".to_string(),
            password_hash: HASH.to_string(),
            role: role.to_string(),
            firstname: Some("Alice".to_string()),
            lastname: None,
            email: None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = CampusConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.tokens.issuer, "campus");
        assert_eq!(config.security.tokens.algorithm, TokenAlgorithm::HS256);
        assert_eq!(config.security.tokens.access_lifetime(), Duration::from_secs(7200));
        assert_eq!(
            config.security.tokens.refresh_lifetime(),
            Duration::from_secs(7 * 86400)
        );
        assert!(!config.policy.enabled);
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_secret() {
        let mut config = valid_config();
        config.security.tokens.access.secret = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { field }) if field == "security.tokens.access.secret"
        ));

        let mut config = valid_config();
        config.security.tokens.refresh.secret = Some(SecretValue::new("  "));
        assert!(matches!(config.validate(), Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_secrets_must_differ() {
        let mut config = valid_config();
        config.security.tokens.refresh.secret = config.security.tokens.access.secret.clone();
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_short_secret_is_only_a_warning() {
        let mut config = valid_config();
        config.accounts.push(account("admin"));
        assert!(config.warnings().is_empty());

        config.security.tokens.access.secret = Some(SecretValue::new("short"));
        assert!(config.validate().is_ok());
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("security.tokens.access.secret"));
    }

    #[test]
    fn test_credentials_with_wildcard_origin_warns() {
        let mut config = valid_config();
        config.server.cors.allow_credentials = true;
        assert!(config
            .warnings()
            .iter()
            .any(|w| w.contains("allow_credentials")));
    }

    #[test]
    fn test_lifetime_ordering() {
        let mut config = valid_config();
        config.security.tokens.access.lifetime = Some(Duration::from_secs(7 * 86400));
        assert!(config.validate().is_err());

        config.security.tokens.access.lifetime = Some(Duration::ZERO);
        assert!(config.validate().is_err());

        config.security.tokens.access.lifetime = Some(Duration::from_secs(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let mut config = valid_config();
        config.security.tokens.algorithm = TokenAlgorithm::RS256;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("security.tokens.algorithm"));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("hs512".parse::<TokenAlgorithm>().unwrap(), TokenAlgorithm::HS512);
        assert!("none".parse::<TokenAlgorithm>().is_err());
    }

    #[test]
    fn test_policy_requires_paths() {
        let mut config = valid_config();
        config.policy.enabled = true;
        assert!(matches!(config.validate(), Err(ConfigError::MissingField { .. })));

        config.policy.model_path = Some(PathBuf::from("model.conf"));
        config.policy.policy_path = Some(PathBuf::from("policy.csv"));
        assert!(config.validate().is_ok());
        assert!(config.policy.paths().is_some());
    }

    #[test]
    fn test_account_validation() {
        let mut config = valid_config();
        config.accounts.push(account("teacher"));
        assert!(config.validate().is_ok());

        config.accounts[0].role = "dean".to_string();
        assert!(config.validate().is_err());

        config.accounts[0].role = "teacher".to_string();
        config.accounts[0].password_hash = "plaintext".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("accounts[0].password_hash"));
    }

    #[test]
    fn test_duplicate_account() {
        let mut config = valid_config();
        config.accounts.push(account("teacher"));
        config.accounts.push(account("admin"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_account_to_new_user() {
        let user = account("Teacher").to_new_user().unwrap();
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.firstname, "Alice");
        assert!(user.lastname.is_empty());
    }

    #[test]
    fn test_password_cost_validation() {
        let mut config = valid_config();
        config.security.password.parallelism = 4;
        config.security.password.memory_kib = 16;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_value_is_masked() {
        let secret = SecretValue::new("super-secret");
        assert_eq!(secret.to_string(), "***");
        assert!(!format!("{:?}", secret).contains("super-secret"));
        assert_eq!(secret.raw(), "super-secret");
    }

    #[test]
    fn test_redacted() {
        let mut config = valid_config();
        config.accounts.push(account("admin"));
        let json = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!json.contains("access-secret"));
        assert!(!json.contains("$argon2id"));
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(duration_from_str("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(duration_from_str("7d").unwrap(), Duration::from_secs(604800));
        assert_eq!(duration_from_str("45").unwrap(), Duration::from_secs(45));
        assert!(duration_from_str("soon").is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
