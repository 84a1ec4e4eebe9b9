// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token claims.

use std::fmt;

use campus_core::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// TokenKind
// =============================================================================

/// The two kinds of session token.
///
/// Each kind has its own signing secret and its own lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential for API calls.
    Access,
    /// Longer-lived credential used only to mint access tokens.
    Refresh,
}

impl TokenKind {
    /// Returns the kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Typed token claims, produced by a single decode step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username the token was issued for.
    pub sub: String,

    /// Role of the subject at issuance.
    pub role: Role,

    /// Issuer.
    pub iss: String,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Expiry (Unix seconds).
    pub exp: i64,

    /// Token id.
    pub jti: String,
}

impl Claims {
    /// Returns the subject.
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Returns the expiry instant.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issuance instant.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Returns `true` if `iat <= now < exp`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        self.iat <= now && now < self.exp
    }
}

// =============================================================================
// Tests
// =============================================================================
