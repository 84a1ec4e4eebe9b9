// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the domain layer.
//!
//! ```text
//! CoreError (root)
//! ├── StoreError   - repository lookups and mutations
//! └── DomainError  - domain rule violations (role labels, mark bounds)
//! ```

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for domain operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// CoreError
// =============================================================================

/// The root error type for the domain layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Domain rule violation.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

// =============================================================================
// StoreError
// =============================================================================

/// Errors raised by repositories.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind ("user", "course", ...).
        entity: &'static str,
        /// Lookup key.
        key: String,
    },

    /// A uniqueness constraint was violated.
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// Entity kind.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },

    /// The operation is not valid for the referenced records.
    #[error("Invalid operation: {message}")]
    Invalid {
        /// Description of the violation.
        message: String,
    },

    /// The backing store is unavailable.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(entity: &'static str, key: impl ToString) -> Self {
        Self::Conflict {
            entity,
            key: key.to_string(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// =============================================================================
// DomainError
// =============================================================================

/// Domain rule violations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Unknown role label.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Unknown mark component.
    #[error("Unknown mark component: {0}")]
    UnknownComponent(String),

    /// A mark is outside the allowed range for its component.
    #[error("Mark {value} out of range for {component} (0..={max})")]
    MarkOutOfRange {
        /// Component name.
        component: &'static str,
        /// Rejected value.
        value: f64,
        /// Upper bound.
        max: f64,
    },
}

// =============================================================================
// Tests
// =============================================================================
