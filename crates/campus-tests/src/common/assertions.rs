// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Assertion helpers with informative failure messages.

use axum::http::StatusCode;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

use super::harness::TestResponse;

// =============================================================================
// Response Assertions
// =============================================================================

/// Assertion extensions for [`TestResponse`].
pub trait ResponseAssertions {
    /// Assert the status code.
    fn assert_status(&self, expected: StatusCode) -> &Self;

    /// Assert a 200 response.
    fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Assert a 401 response with the given error code.
    fn assert_unauthorized(&self, code: &str) -> &Self;

    /// Assert a 403 response.
    fn assert_forbidden(&self) -> &Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }
}

impl ResponseAssertions for TestResponse {
    fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected {}, got {} with body {}",
            expected, self.status, self.body
        );
        self
    }

    fn assert_unauthorized(&self, code: &str) -> &Self {
        self.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            self.error_code(),
            Some(code),
            "Unexpected error code in {}",
            self.body
        );
        self
    }
}

// =============================================================================
// Token Assertions
// =============================================================================

/// Decodes the claims segment of a compact JWS without verifying it.
pub fn decode_claims(token: &str) -> Value {
    let segments: Vec<&str> = token.split('.').collect();
    assert_eq!(segments.len(), 3, "Token is not a compact JWS: {token}");
    let payload = URL_SAFE_NO_PAD
        .decode(segments[1])
        .expect("claims segment is not base64url");
    serde_json::from_slice(&payload).expect("claims segment is not JSON")
}

/// Asserts that a token carries the expected subject and role.
pub fn assert_claims(token: &str, subject: &str, role: &str) {
    let claims = decode_claims(token);
    assert_eq!(claims["sub"], subject, "Unexpected subject in {claims}");
    assert_eq!(claims["role"], role, "Unexpected role in {claims}");
}

/// Asserts that two floats are within `1e-9`.
pub fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "Expected {expected}, got {actual}"
    );
}
