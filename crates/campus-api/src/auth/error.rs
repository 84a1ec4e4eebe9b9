// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the authentication core.
//!
//! ```text
//! AuthError (login / refresh)
//! ├── PasswordError  - hashing and verification
//! ├── TokenError     - issuance and verification
//! └── StoreError     - credential lookup
//!
//! PolicyError        - policy model / policy file loading (fatal at startup)
//! ```
//!
//! None of these carry the raw library error into HTTP responses; the
//! conversion into [`ApiError`](crate::error::ApiError) keeps only the
//! classification.

use std::path::PathBuf;

use campus_core::StoreError;
use thiserror::Error;

// =============================================================================
// PasswordError
// =============================================================================

/// Password hashing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The plaintext or the stored hash is empty.
    #[error("Empty input")]
    EmptyInput,

    /// The stored value is not a PHC-formatted hash.
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    /// The hashing primitive failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// The cost parameters are invalid.
    #[error("Invalid hashing parameters: {0}")]
    Params(String),
}

// =============================================================================
// TokenError
// =============================================================================

/// Token issuance and verification errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token cannot be parsed.
    #[error("Malformed token")]
    Malformed,

    /// The signature does not match the secret for the expected kind.
    #[error("Token signature does not match")]
    BadSignature,

    /// The token is outside its validity window.
    #[error("Token has expired")]
    Expired,

    /// The header declares an algorithm other than the configured HMAC one.
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signing failed.
    #[error("Token encoding failed: {0}")]
    Encoding(String),

    /// The codec configuration is invalid.
    #[error("Invalid token configuration: {0}")]
    InvalidConfig(String),
}

impl TokenError {
    /// Creates an invalid configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

// =============================================================================
// AuthError
// =============================================================================

/// Login and refresh errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No user with the given username.
    #[error("User not found")]
    UserNotFound,

    /// The password does not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Username or password is empty.
    #[error("Empty input")]
    EmptyInput,

    /// The refresh token failed verification.
    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(TokenError),

    /// Credential store failure other than not-found.
    #[error("Credential store error: {0}")]
    Store(StoreError),

    /// Token issuance failed.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Password verification failed for a reason other than a mismatch.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            Self::UserNotFound
        } else {
            Self::Store(err)
        }
    }
}

// =============================================================================
// PolicyError
// =============================================================================

/// Policy loading failures. Fatal at startup.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The model definition is invalid.
    #[error("Invalid policy model: {0}")]
    Model(String),

    /// A policy line is invalid.
    #[error("Invalid policy line {line}: {message}")]
    Policy {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The engine has no backing files to reload from.
    #[error("Policy engine has no source to reload from")]
    NoSource,

    /// The enforcer rejected an operation.
    #[error("Policy enforcer error: {0}")]
    Enforcer(String),
}

impl PolicyError {
    /// Creates a model error.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }

    /// Creates a policy line error.
    pub fn line(line: usize, message: impl Into<String>) -> Self {
        Self::Policy {
            line,
            message: message.into(),
        }
    }

    /// Wraps an enforcer failure.
    pub fn enforcer(err: impl std::fmt::Display) -> Self {
        Self::Enforcer(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_becomes_user_not_found() {
        let err: AuthError = StoreError::not_found("user", "ghost").into();
        assert!(matches!(err, AuthError::UserNotFound));

        let err: AuthError = StoreError::unavailable("down").into();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[test]
    fn test_policy_line_display() {
        let err = PolicyError::line(3, "expected 4 fields");
        assert_eq!(err.to_string(), "Invalid policy line 3: expected 4 fields");
    }
}
