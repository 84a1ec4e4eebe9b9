// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Login and refresh.
//!
//! Both entry points are stateless: no session record is created, and the
//! refresh token is not rotated. It stays valid until its own expiry.

use std::sync::Arc;

use campus_core::CredentialStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::claims::TokenKind;
use super::error::AuthError;
use super::jwt::TokenCodec;
use super::password::PasswordHasher;

/// An access token and a refresh token issued together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Longer-lived refresh token.
    pub refresh_token: String,
}

/// Orchestrates credential checks and token issuance.
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    codec: TokenCodec,
}

impl Authenticator {
    /// Creates an authenticator.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        codec: TokenCodec,
    ) -> Self {
        Self {
            credentials,
            hasher,
            codec,
        }
    }

    /// Verifies credentials and issues a token pair.
    ///
    /// An unknown username yields [`AuthError::UserNotFound`]; callers must
    /// render it the same way as [`AuthError::InvalidCredentials`].
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::EmptyInput);
        }

        let user = match self.credentials.get_by_username(username).await {
            Ok(user) => user,
            Err(e) => {
                let err = AuthError::from(e);
                if matches!(err, AuthError::UserNotFound) {
                    self.hasher.verify_dummy(password);
                    warn!(user = %username, "Login failed");
                }
                return Err(err);
            }
        };

        if !self.hasher.verify(&user.password_hash, password)? {
            warn!(user = %username, "Login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = TokenPair {
            access_token: self.codec.issue(TokenKind::Access, &user.username, user.role, now)?,
            refresh_token: self.codec.issue(TokenKind::Refresh, &user.username, user.role, now)?,
        };

        info!(user = %user.username, role = %user.role, "Login succeeded");
        Ok(pair)
    }

    /// Verifies a refresh token and issues a new access token for its subject.
    pub fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = self
            .codec
            .verify(TokenKind::Refresh, refresh_token, now)
            .map_err(|e| {
                debug!(error = %e, "Refresh token rejected");
                AuthError::InvalidRefreshToken(e)
            })?;

        let access = self
            .codec
            .issue(TokenKind::Access, &claims.sub, claims.role, now)?;
        debug!(user = %claims.sub, role = %claims.role, "Access token refreshed");
        Ok(access)
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Returns the password hasher.
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}

// =============================================================================
// Tests
// =============================================================================
