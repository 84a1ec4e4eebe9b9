// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! This module provides a comprehensive error type that maps to HTTP status codes
//! and JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campus_core::{CoreError, DomainError, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AuthError, PasswordError, PolicyError, TokenError};

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
///
/// Authentication failures render as 401 and authorization failures as 403.
/// Each variant carries a stable machine-readable code; the underlying
/// library error is logged, never rendered.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown user or wrong password (401). Both render identically.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A required credential field is empty (400).
    #[error("Empty input")]
    EmptyInput,

    /// No bearer token on a protected route (401).
    #[error("Missing bearer token")]
    MissingToken,

    /// The access token failed verification (401).
    #[error("Invalid token: {0}")]
    InvalidToken(TokenError),

    /// The refresh token failed verification (401).
    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(TokenError),

    /// The verified role may not access the route (403).
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Error message (for logging, not user-facing).
        message: String,
    },

    /// Resource not found (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Bad request (400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Validation error (422).
    #[error("Validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },

    /// Conflict (409).
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Service unavailable (503).
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a service unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials
            | ApiError::MissingToken
            | ApiError::InvalidToken(_)
            | ApiError::InvalidRefreshToken(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::EmptyInput | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::EmptyInput => "EMPTY_INPUT",
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::InvalidToken(e) => match e {
                TokenError::BadSignature => "BAD_SIGNATURE",
                TokenError::Expired => "TOKEN_EXPIRED",
                TokenError::UnsupportedAlgorithm(_) => "UNSUPPORTED_ALGORITHM",
                _ => "MALFORMED_TOKEN",
            },
            ApiError::InvalidRefreshToken(_) => "INVALID_REFRESH_TOKEN",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns a user-friendly error message.
    ///
    /// This message is safe to show to end users and does not expose
    /// internal implementation details.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidCredentials => "Invalid username or password".to_string(),
            ApiError::EmptyInput => "Required fields must not be empty".to_string(),
            ApiError::MissingToken => "Authentication required".to_string(),
            ApiError::InvalidToken(TokenError::Expired) => "Token has expired".to_string(),
            ApiError::InvalidToken(_) => "Invalid token".to_string(),
            ApiError::InvalidRefreshToken(_) => "Invalid refresh token".to_string(),
            ApiError::Forbidden { .. } => "Access denied".to_string(),
            ApiError::NotFound { resource } => format!("{} not found", resource),
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Validation { message, .. } => format!("Validation failed: {}", message),
            ApiError::Conflict { message } => message.clone(),
            ApiError::ServiceUnavailable { .. } => {
                "Service temporarily unavailable".to_string()
            }
            ApiError::Internal { .. } => "Internal server error".to_string(),
        }
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ApiError::Internal { .. } | ApiError::ServiceUnavailable { .. }
        )
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.user_message();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Client error occurred"
            );
        }

        let body = ErrorResponseBody {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Error Response Body
// =============================================================================

/// Error response body structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

// =============================================================================
// From Implementations
// =============================================================================

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserNotFound | AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::EmptyInput => ApiError::EmptyInput,
            AuthError::InvalidRefreshToken(e) => ApiError::InvalidRefreshToken(e),
            AuthError::Store(e) => e.into(),
            AuthError::Token(e) => e.into(),
            AuthError::Password(PasswordError::EmptyInput) => ApiError::EmptyInput,
            AuthError::Password(PasswordError::MalformedHash(detail)) => {
                tracing::error!(error = %detail, "Stored password hash is not a PHC string");
                ApiError::InvalidCredentials
            }
            AuthError::Password(e) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(_) | TokenError::InvalidConfig(_) => {
                ApiError::internal(err.to_string())
            }
            other => ApiError::InvalidToken(other),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::EmptyInput => ApiError::EmptyInput,
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Io { .. } | PolicyError::Enforcer(_) => {
                ApiError::internal(err.to_string())
            }
            PolicyError::NoSource => ApiError::conflict(err.to_string()),
            PolicyError::Model(_) | PolicyError::Policy { .. } => {
                ApiError::validation(err.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => ApiError::not_found(entity),
            StoreError::Conflict { entity, key } => {
                ApiError::conflict(format!("{} already exists: {}", entity, key))
            }
            StoreError::Invalid { message } => ApiError::bad_request(message),
            StoreError::Unavailable { message } => ApiError::service_unavailable(message),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Store(e) => e.into(),
            CoreError::Domain(e) => e.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
