// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the campus binary.
//!
//! Each variant maps to a process exit code:
//!
//! | code | cause |
//! |------|-------|
//! | 1 | configuration could not be loaded or is invalid |
//! | 2 | the policy model or rules could not be loaded |
//! | 3 | password hashing or account seeding failed |
//! | 4 | the server failed while running |
//! | 5 | terminal or file I/O failed |

use campus_api::auth::{PasswordError, PolicyError};
use campus_config::ConfigError;
use thiserror::Error;

/// Result type alias for campus-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the campus binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration problem detected by the binary itself.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The policy engine could not be built.
    #[error("Policy error: {message}")]
    Policy {
        /// What went wrong.
        message: String,
        /// Underlying policy error, if any.
        #[source]
        source: Option<PolicyError>,
    },

    /// Password hashing parameters or input were rejected.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// A bootstrap account could not be inserted.
    #[error("Failed to seed accounts: {0}")]
    Seed(#[from] campus_core::StoreError),

    /// The HTTP server failed.
    #[error("Server error: {0}")]
    Server(#[from] campus_api::ApiError),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error with added context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a policy error without an underlying cause.
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy {
            message: msg.into(),
            source: None,
        }
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => 1,
            Self::Policy { .. } => 2,
            Self::Password(_) | Self::Seed(_) => 3,
            Self::Server(_) | Self::Runtime(_) => 4,
            Self::Io(_) => 5,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }

    /// Returns the configuration error at the root of this error, if any.
    fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(e) => Some(e),
            Self::WithContext { source, .. } => source.config_error(),
            _ => None,
        }
    }
}

impl From<PolicyError> for BinError {
    fn from(err: PolicyError) -> Self {
        Self::Policy {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain.
///
/// Configuration errors are shown with their short user-facing message.
pub fn report_error(error: &BinError) {
    if let Some(config) = error.config_error() {
        eprintln!("Error: {}", config.user_message());
        return;
    }

    eprintln!("Error: {}", error);
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BinError::config("test error");
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_error_with_context() {
        let err = BinError::policy("bad model").with_context("loading policy");
        assert_eq!(err.to_string(), "loading policy: Policy error: bad model");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::config("test").exit_code(), 1);
        assert_eq!(BinError::policy("test").exit_code(), 2);
        assert_eq!(BinError::from(PasswordError::EmptyInput).exit_code(), 3);
        assert_eq!(BinError::runtime("test").exit_code(), 4);
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert_eq!(BinError::from(io).exit_code(), 5);
    }

    #[test]
    fn test_policy_error_keeps_source() {
        let err = BinError::from(PolicyError::NoSource);
        assert_eq!(err.exit_code(), 2);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_found_through_context() {
        let err = BinError::from(ConfigError::missing_field("server"))
            .with_context("loading campus.yaml");
        assert_eq!(err.exit_code(), 1);
        assert!(err.config_error().is_some());
        assert!(BinError::runtime("x").config_error().is_none());
    }
}
