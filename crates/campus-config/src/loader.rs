// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing.
//!
//! # Loading Pipeline
//!
//! 1. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw text
//! 2. Parse YAML, TOML or JSON, chosen by file extension
//! 3. Apply `CAMPUS_*` environment overrides
//! 4. Resolve relative policy paths against the config file directory
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! CAMPUS_SERVER_HOST=127.0.0.1
//! CAMPUS_SERVER_PORT=9090
//! CAMPUS_ACCESS_TOKEN_SECRET=...
//! CAMPUS_REFRESH_TOKEN_SECRET=...
//! CAMPUS_ACCESS_TOKEN_LIFETIME=15m
//! CAMPUS_REFRESH_TOKEN_LIFETIME=1d
//! CAMPUS_POLICY_ENABLED=true
//! CAMPUS_LOG_LEVEL=debug
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{duration_from_str, CampusConfig, LogLevel, SecretValue};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "CAMPUS";

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use campus_config::loader::ConfigLoader;
///
/// let loader = ConfigLoader::new();
/// let config = loader.load("campus.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for resolving relative paths.
    base_path: Option<PathBuf>,

    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve placeholders and apply overrides.
    resolve_env_vars: bool,

    /// Whether to resolve relative paths.
    resolve_paths: bool,
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            base_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
        }
    }

    /// Creates a builder for configuring the loader.
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder::new()
    }

    /// Sets the base path for resolving relative paths.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables relative path resolution.
    pub fn with_path_resolution(mut self, enabled: bool) -> Self {
        self.resolve_paths = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The file format is determined by the file extension:
    /// - `.yaml` or `.yml` - YAML format
    /// - `.toml` - TOML format
    /// - `.json` - JSON format
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<CampusConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let base_path = self.base_path.clone().unwrap_or_else(|| {
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let mut config = self.parse_content(&content, format, path)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        if self.resolve_paths {
            self.resolve_relative_paths(&mut config, &base_path);
        }

        config.validate()?;
        for warning in config.warnings() {
            warn!("{}", warning);
        }

        info!("Configuration loaded successfully");
        debug!(
            accounts = config.accounts.len(),
            policy_enabled = config.policy.enabled,
            addr = %config.server.socket_addr(),
            "Configuration summary"
        );

        Ok(config)
    }

    /// Loads configuration from a string.
    ///
    /// Relative policy paths resolve against the base path when one is set.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<CampusConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)?
        } else {
            content.to_string()
        };
        let mut config: CampusConfig = parse_str(&content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        if self.resolve_paths {
            if let Some(base_path) = &self.base_path {
                self.resolve_relative_paths(&mut config, base_path);
            }
        }

        config.validate()?;

        Ok(config)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> ConfigResult<CampusConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)?
        } else {
            content.to_string()
        };

        parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })
    }

    /// Resolves environment variable placeholders in content.
    ///
    /// Supports the format: `${VAR_NAME}` or `${VAR_NAME:default}`. An unset
    /// variable without a default is left in place.
    fn resolve_env_placeholders(&self, content: &str) -> ConfigResult<String> {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' || chars.peek() != Some(&'{') {
                result.push(c);
                continue;
            }
            chars.next();

            let mut var_content = String::new();
            let mut found_close = false;
            for c in chars.by_ref() {
                if c == '}' {
                    found_close = true;
                    break;
                }
                var_content.push(c);
            }

            if !found_close {
                result.push_str("${");
                result.push_str(&var_content);
                continue;
            }

            let (var_name, default_value) = match var_content.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (var_content.as_str(), None),
            };

            match (env::var(var_name), default_value) {
                (Ok(value), _) => result.push_str(&value),
                (Err(_), Some(default)) => result.push_str(default),
                (Err(_), None) => {
                    warn!("Environment variable '{}' not found", var_name);
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        }

        Ok(result)
    }

    fn env_var(&self, suffix: &str) -> (String, Option<String>) {
        let name = format!("{}_{}", self.env_prefix, suffix);
        let value = env::var(&name).ok();
        (name, value)
    }

    /// Applies `CAMPUS_*` environment overrides.
    fn apply_env_overrides(&self, config: &mut CampusConfig) -> ConfigResult<()> {
        if let (name, Some(value)) = self.env_var("SERVER_HOST") {
            config.server.host = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected an IP address"))?;
        }
        if let (name, Some(value)) = self.env_var("SERVER_PORT") {
            config.server.port = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected valid port number"))?;
        }

        let tokens = &mut config.security.tokens;
        if let (_, Some(value)) = self.env_var("ACCESS_TOKEN_SECRET") {
            tokens.access.secret = Some(SecretValue::new(value));
        }
        if let (_, Some(value)) = self.env_var("REFRESH_TOKEN_SECRET") {
            tokens.refresh.secret = Some(SecretValue::new(value));
        }
        if let (name, Some(value)) = self.env_var("ACCESS_TOKEN_LIFETIME") {
            let lifetime = duration_from_str(&value)
                .map_err(|_| ConfigError::invalid_env_var(name, "expected a duration such as 2h"))?;
            tokens.access.lifetime = Some(lifetime);
        }
        if let (name, Some(value)) = self.env_var("REFRESH_TOKEN_LIFETIME") {
            let lifetime = duration_from_str(&value)
                .map_err(|_| ConfigError::invalid_env_var(name, "expected a duration such as 7d"))?;
            tokens.refresh.lifetime = Some(lifetime);
        }

        if let (_, Some(value)) = self.env_var("POLICY_ENABLED") {
            config.policy.enabled = parse_bool(&value);
        }

        if let (name, Some(value)) = self.env_var("LOG_LEVEL") {
            match LogLevel::parse(&value) {
                Some(level) => config.logging.level = level,
                None => warn!(var = %name, value = %value, "Ignoring unknown log level"),
            }
        }

        Ok(())
    }

    /// Resolves relative policy paths against `base_path`.
    fn resolve_relative_paths(&self, config: &mut CampusConfig, base_path: &Path) {
        let policy = &mut config.policy;
        for path in [&mut policy.model_path, &mut policy.policy_path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base_path.join(&*path);
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigLoaderBuilder
// =============================================================================

/// Builder for ConfigLoader.
#[derive(Debug, Default)]
pub struct ConfigLoaderBuilder {
    base_path: Option<PathBuf>,
    env_prefix: Option<String>,
    resolve_env_vars: Option<bool>,
    resolve_paths: Option<bool>,
}

impl ConfigLoaderBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base path.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment prefix.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn resolve_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = Some(enabled);
        self
    }

    /// Enables or disables path resolution.
    pub fn resolve_paths(mut self, enabled: bool) -> Self {
        self.resolve_paths = Some(enabled);
        self
    }

    /// Builds the ConfigLoader.
    pub fn build(self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();

        if let Some(base_path) = self.base_path {
            loader.base_path = Some(base_path);
        }
        if let Some(prefix) = self.env_prefix {
            loader.env_prefix = prefix;
        }
        if let Some(resolve_env_vars) = self.resolve_env_vars {
            loader.resolve_env_vars = resolve_env_vars;
        }
        if let Some(resolve_paths) = self.resolve_paths {
            loader.resolve_paths = resolve_paths;
        }

        loader
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// Parses a string to bool.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

/// YAML goes through the `config` crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
///
/// ```no_run
/// use campus_config::loader::load_config;
///
/// let config = load_config("campus.yaml").unwrap();
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<CampusConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<CampusConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn test_yaml() -> &'static str {
        r#"
server:
  host: 127.0.0.1
  port: 9000
  request_timeout: 10s

security:
  tokens:
    issuer: campus-test
    algorithm: HS384
    access:
      secret: access-secret-for-loader-tests-000000
      lifetime: 15m
    refresh:
      secret: refresh-secret-for-loader-tests-00000
      lifetime: 1d

policy:
  enabled: true
  model_path: rbac_model.conf
  policy_path: /etc/campus/rbac_policy.csv

accounts:
  - username: root
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo"
    role: admin

logging:
  level: debug
  format: json
"#
    }

    // Prefix unique to this module so overrides never leak from the host.
    fn isolated_loader() -> ConfigLoader {
        ConfigLoader::new().with_env_prefix("CAMPUS_LOADER_TEST_UNSET")
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(test_yaml().as_bytes()).unwrap();

        let config = isolated_loader().load(file.path()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout, Duration::from_secs(10));
        assert_eq!(config.security.tokens.issuer, "campus-test");
        assert_eq!(
            config.security.tokens.access_lifetime(),
            Duration::from_secs(15 * 60)
        );
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_relative_policy_path_resolution() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(test_yaml().as_bytes()).unwrap();
        let dir = file.path().parent().unwrap().to_path_buf();

        let config = isolated_loader().load(file.path()).unwrap();

        assert_eq!(
            config.policy.model_path.as_deref(),
            Some(dir.join("rbac_model.conf").as_path())
        );
        assert_eq!(
            config.policy.policy_path.as_deref(),
            Some(Path::new("/etc/campus/rbac_policy.csv"))
        );
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[security.tokens.access]
secret = "access-secret-for-loader-tests-000000"

[security.tokens.refresh]
secret = "refresh-secret-for-loader-tests-00000"
"#;
        let config = isolated_loader()
            .load_from_str(toml, ConfigFormat::Toml)
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.security.tokens.refresh_lifetime(),
            Duration::from_secs(7 * 86400)
        );
    }

    #[test]
    fn test_load_json_missing_secret() {
        let json = r#"{"server": {"port": 8081}}"#;
        let result = isolated_loader().load_from_str(json, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{"server": {"prot": 8081}}"#;
        let result = isolated_loader().load_from_str(json, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::Serialization { .. })));
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("campus.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("campus.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("campus.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("campus.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("campus.ini")).is_err());
    }

    #[test]
    fn test_env_placeholder_with_default() {
        let loader = ConfigLoader::new();
        let result = loader
            .resolve_env_placeholders("value: ${CAMPUS_NONEXISTENT_VAR:fallback}")
            .unwrap();
        assert_eq!(result, "value: fallback");
    }

    #[test]
    fn test_env_placeholder_unset_kept() {
        let loader = ConfigLoader::new();
        let result = loader
            .resolve_env_placeholders("value: ${CAMPUS_NONEXISTENT_VAR}")
            .unwrap();
        assert_eq!(result, "value: ${CAMPUS_NONEXISTENT_VAR}");
    }

    #[test]
    fn test_env_placeholder_unclosed() {
        let loader = ConfigLoader::new();
        let result = loader.resolve_env_placeholders("value: ${OPEN").unwrap();
        assert_eq!(result, "value: ${OPEN");
    }

    #[test]
    fn test_dollar_signs_in_hash_untouched() {
        let loader = ConfigLoader::new();
        let hash = "$argon2id$v=19$m=19456,t=2,p=1$salt$hash";
        assert_eq!(loader.resolve_env_placeholders(hash).unwrap(), hash);
    }

    #[test]
    fn test_env_overrides() {
        let prefix = "CAMPUS_LOADER_TEST_OVERRIDE";
        env::set_var(format!("{}_SERVER_PORT", prefix), "9191");
        env::set_var(format!("{}_ACCESS_TOKEN_LIFETIME", prefix), "30m");
        env::set_var(format!("{}_POLICY_ENABLED", prefix), "false");
        env::set_var(format!("{}_LOG_LEVEL", prefix), "warn");

        let config = ConfigLoader::new()
            .with_env_prefix(prefix)
            .load_from_str(test_yaml(), ConfigFormat::Yaml)
            .unwrap();

        assert_eq!(config.server.port, 9191);
        assert_eq!(
            config.security.tokens.access_lifetime(),
            Duration::from_secs(30 * 60)
        );
        assert!(!config.policy.enabled);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_env_override() {
        let prefix = "CAMPUS_LOADER_TEST_BADPORT";
        env::set_var(format!("{}_SERVER_PORT", prefix), "not-a-port");

        let result = ConfigLoader::new()
            .with_env_prefix(prefix)
            .load_from_str(test_yaml(), ConfigFormat::Yaml);

        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn test_loader_builder() {
        let loader = ConfigLoader::builder()
            .env_prefix("MYAPP")
            .resolve_env_vars(false)
            .resolve_paths(true)
            .build();

        assert_eq!(loader.env_prefix, "MYAPP");
        assert!(!loader.resolve_env_vars);
        assert!(loader.resolve_paths);
    }

    #[test]
    fn test_file_not_found() {
        let result = ConfigLoader::new().load("/nonexistent/path/campus.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
