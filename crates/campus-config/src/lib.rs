// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-config
//!
//! Configuration management for the campus administration service.
//!
//! ## Features
//!
//! - **Schema Definition**: server, token, password, policy, account and
//!   logging settings with validation
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `CAMPUS_*` variables override file values
//! - **Secret Masking**: token secrets never appear in logs or debug output
//!
//! ## Quick Start
//!
//! ```no_run
//! use campus_config::loader::load_config;
//!
//! let config = load_config("campus.yaml").unwrap();
//! println!("Listening on {}", config.server.socket_addr());
//! println!("Bootstrap accounts: {}", config.accounts.len());
//! ```
//!
//! ## Placeholders
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! security:
//!   tokens:
//!     access:
//!       secret: "${CAMPUS_ACCESS_SECRET}"
//!       lifetime: "${ACCESS_LIFETIME:2h}"
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader, ConfigLoaderBuilder};
pub use schema::{
    AccountConfig, CampusConfig, CorsConfig, LogFormat, LogLevel, LoggingConfig, PasswordConfig,
    PolicyConfig, SecretValue, SecurityConfig, ServerConfig, TokenAlgorithm, TokenKeyConfig,
    TokensConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert_eq!(NAME, "campus-config");
    }

    #[test]
    fn test_default_config_needs_secrets() {
        assert!(CampusConfig::default().validate().is_err());
    }
}
