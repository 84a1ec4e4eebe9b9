// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token codec.
//!
//! Tokens are compact JWS strings signed with HMAC. Access and refresh tokens
//! use distinct secrets, so a token only verifies as the kind it was issued
//! as. Expiry is checked against the `now` supplied by the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use campus_core::Role;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use super::error::TokenError;

/// Default access token lifetime.
pub const DEFAULT_ACCESS_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

/// Default refresh token lifetime.
pub const DEFAULT_REFRESH_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Secrets shorter than this are accepted with a warning.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

// =============================================================================
// TokenConfig
// =============================================================================

/// Signing secret and lifetime for one token kind.
#[derive(Clone)]
pub struct KeyConfig {
    /// HMAC secret.
    pub secret: String,
    /// Lifetime of tokens of this kind.
    pub lifetime: Duration,
}

impl KeyConfig {
    /// Creates a key configuration.
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            lifetime,
        }
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("secret", &"***")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Token codec configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Issuer written into and required from every token.
    pub issuer: String,
    /// HMAC algorithm.
    pub algorithm: Algorithm,
    /// Access token key.
    pub access: KeyConfig,
    /// Refresh token key.
    pub refresh: KeyConfig,
}

impl TokenConfig {
    /// Creates a configuration with default lifetimes and HS256.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            issuer: "campus".to_string(),
            algorithm: Algorithm::HS256,
            access: KeyConfig::new(access_secret, DEFAULT_ACCESS_LIFETIME),
            refresh: KeyConfig::new(refresh_secret, DEFAULT_REFRESH_LIFETIME),
        }
    }

    /// Creates a configuration with fixed test secrets.
    pub fn for_testing() -> Self {
        Self::new(
            "access-secret-for-tests-0123456789abcdef",
            "refresh-secret-for-tests-0123456789abcdef",
        )
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the access token lifetime.
    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access.lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    pub fn with_refresh_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh.lifetime = lifetime;
        self
    }

    /// Returns the key configuration for `kind`.
    pub fn key(&self, kind: TokenKind) -> &KeyConfig {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), TokenError> {
        if !is_hmac(self.algorithm) {
            return Err(TokenError::config(format!(
                "algorithm {:?} is not an HMAC algorithm",
                self.algorithm
            )));
        }
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let key = self.key(kind);
            if key.secret.is_empty() {
                return Err(TokenError::config(format!("{kind} token secret is not configured")));
            }
            if key.lifetime.is_zero() {
                return Err(TokenError::config(format!("{kind} token lifetime must be non-zero")));
            }
            if key.secret.len() < RECOMMENDED_SECRET_LEN {
                tracing::warn!(
                    kind = %kind,
                    "Token secret is shorter than recommended ({} bytes)",
                    RECOMMENDED_SECRET_LEN
                );
            }
        }
        if self.access.secret == self.refresh.secret {
            return Err(TokenError::config(
                "access and refresh token secrets must differ",
            ));
        }
        if self.access.lifetime >= self.refresh.lifetime {
            return Err(TokenError::config(
                "access token lifetime must be shorter than refresh token lifetime",
            ));
        }
        Ok(())
    }
}

/// Returns `true` for the HMAC family.
pub fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

// =============================================================================
// TokenCodec
// =============================================================================

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

struct CodecInner {
    issuer: String,
    algorithm: Algorithm,
    access: KindKeys,
    refresh: KindKeys,
    validation: Validation,
}

/// Signs and verifies session tokens.
///
/// Cloning is cheap; all clones share the same keys.
#[derive(Clone)]
pub struct TokenCodec {
    inner: Arc<CodecInner>,
}

impl TokenCodec {
    /// Creates a codec after validating the configuration.
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        config.validate()?;

        let keys = |key: &KeyConfig| KindKeys {
            encoding: EncodingKey::from_secret(key.secret.as_bytes()),
            decoding: DecodingKey::from_secret(key.secret.as_bytes()),
            lifetime_secs: i64::try_from(key.lifetime.as_secs()).unwrap_or(i64::MAX),
        };

        // Expiry is checked against the caller's clock below.
        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);
        validation.set_issuer(&[&config.issuer]);

        Ok(Self {
            inner: Arc::new(CodecInner {
                access: keys(&config.access),
                refresh: keys(&config.refresh),
                issuer: config.issuer,
                algorithm: config.algorithm,
                validation,
            }),
        })
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.inner.access,
            TokenKind::Refresh => &self.inner.refresh,
        }
    }

    /// Issues a token of `kind` for `subject` with expiry `now + lifetime(kind)`.
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let iat = now.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iss: self.inner.issuer.clone(),
            iat,
            exp: iat.saturating_add(keys.lifetime_secs),
            jti: Uuid::now_v7().to_string(),
        };

        encode(&Header::new(self.inner.algorithm), &claims, &keys.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verifies a token of `kind` at instant `now`.
    pub fn verify(
        &self,
        kind: TokenKind,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|_| self.classify_unreadable_header(token))?;
        if header.alg != self.inner.algorithm {
            return Err(TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.inner.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => {
                    TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg))
                }
                _ => TokenError::Malformed,
            })?;

        if !data.claims.is_valid_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }

    /// A header `jsonwebtoken` cannot parse may still name an algorithm it
    /// does not know, such as `none`. That is reported as unsupported.
    fn classify_unreadable_header(&self, token: &str) -> TokenError {
        match declared_algorithm(token) {
            Some(alg) if alg != format!("{:?}", self.inner.algorithm) => {
                TokenError::UnsupportedAlgorithm(alg)
            }
            _ => TokenError::Malformed,
        }
    }

    /// Returns the lifetime of `kind`.
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        Duration::from_secs(self.keys(kind).lifetime_secs.max(0) as u64)
    }

    /// Returns the configured algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.inner.algorithm
    }

    /// Returns the issuer.
    pub fn issuer(&self) -> &str {
        &self.inner.issuer
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.inner.issuer)
            .field("algorithm", &self.inner.algorithm)
            .field("access_lifetime_secs", &self.inner.access.lifetime_secs)
            .field("refresh_lifetime_secs", &self.inner.refresh.lifetime_secs)
            .finish()
    }
}

/// Reads the `alg` member of the first token segment without validating the rest.
fn declared_algorithm(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("alg")?.as_str().map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn codec() -> TokenCodec {
        TokenCodec::new(TokenConfig::for_testing()).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let now = Utc::now();

        let token = codec.issue(TokenKind::Access, "alice", Role::Teacher, now).unwrap();
        let claims = codec.verify(TokenKind::Access, &token, now).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.iss, "campus");
        assert_eq!(claims.exp - claims.iat, 2 * 60 * 60);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let t0 = Utc::now();
        let token = codec.issue(TokenKind::Access, "alice", Role::Teacher, t0).unwrap();
        let lifetime = ChronoDuration::hours(2);

        assert!(codec.verify(TokenKind::Access, &token, t0).is_ok());
        assert!(codec
            .verify(TokenKind::Access, &token, t0 + lifetime - ChronoDuration::seconds(1))
            .is_ok());
        assert_eq!(
            codec.verify(TokenKind::Access, &token, t0 + lifetime),
            Err(TokenError::Expired)
        );
        assert_eq!(
            codec.verify(TokenKind::Access, &token, t0 + ChronoDuration::days(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_kind_secret_cross_check() {
        let codec = codec();
        let now = Utc::now();

        let access = codec.issue(TokenKind::Access, "bob", Role::Student, now).unwrap();
        let refresh = codec.issue(TokenKind::Refresh, "bob", Role::Student, now).unwrap();

        assert_eq!(
            codec.verify(TokenKind::Refresh, &access, now),
            Err(TokenError::BadSignature)
        );
        assert_eq!(
            codec.verify(TokenKind::Access, &refresh, now),
            Err(TokenError::BadSignature)
        );
        assert!(codec.verify(TokenKind::Refresh, &refresh, now).is_ok());
    }

    #[test]
    fn test_malformed_token() {
        let codec = codec();
        let now = Utc::now();

        assert_eq!(codec.verify(TokenKind::Access, "garbage", now), Err(TokenError::Malformed));
        assert_eq!(codec.verify(TokenKind::Access, "", now), Err(TokenError::Malformed));
        assert_eq!(
            codec.verify(TokenKind::Access, "a.b.c", now),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_algorithm_confusion_rejected() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue(TokenKind::Access, "alice", Role::Admin, now).unwrap();

        // Swap the header for one declaring "none".
        let mut parts: Vec<&str> = token.split('.').collect();
        let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        parts[0] = &none_header;
        let forged = parts.join(".");
        assert_eq!(
            codec.verify(TokenKind::Access, &forged, now),
            Err(TokenError::UnsupportedAlgorithm("none".to_string()))
        );

        // A header naming the configured algorithm but otherwise broken.
        let broken_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":5}"#);
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &broken_header;
        let forged = parts.join(".");
        assert_eq!(codec.verify(TokenKind::Access, &forged, now), Err(TokenError::Malformed));

        // A well-formed header with another algorithm.
        let rs_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &rs_header;
        let forged = parts.join(".");
        assert!(matches!(
            codec.verify(TokenKind::Access, &forged, now),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));

        // Same family, different strength.
        let hs512 = TokenCodec::new(
            TokenConfig::for_testing().with_algorithm(Algorithm::HS512),
        )
        .unwrap();
        let token = hs512.issue(TokenKind::Access, "alice", Role::Admin, now).unwrap();
        assert!(matches!(
            codec.verify(TokenKind::Access, &token, now),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue(TokenKind::Access, "alice", Role::Student, now).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let tampered = String::from_utf8(payload)
            .unwrap()
            .replace("\"student\"", "\"admin\"");
        let forged = format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode(tampered), parts[2]);

        assert_eq!(
            codec.verify(TokenKind::Access, &forged, now),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let other = TokenCodec::new(TokenConfig::for_testing().with_issuer("elsewhere")).unwrap();
        let now = Utc::now();
        let token = other.issue(TokenKind::Access, "alice", Role::Admin, now).unwrap();

        assert_eq!(codec().verify(TokenKind::Access, &token, now), Err(TokenError::Malformed));
    }

    #[test]
    fn test_config_validation() {
        assert!(TokenConfig::for_testing().validate().is_ok());

        let same = TokenConfig::new("same-secret-same-secret-same-secret", "same-secret-same-secret-same-secret");
        assert!(matches!(same.validate(), Err(TokenError::InvalidConfig(_))));

        let inverted = TokenConfig::for_testing()
            .with_access_lifetime(Duration::from_secs(240 * 3600))
            .with_refresh_lifetime(Duration::from_secs(15 * 60));
        assert!(inverted.validate().is_err());

        let empty = TokenConfig::new("", "refresh");
        assert!(empty.validate().is_err());

        let rsa = TokenConfig::for_testing().with_algorithm(Algorithm::RS256);
        assert!(rsa.validate().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = TokenConfig::for_testing();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("access-secret-for-tests"));
        assert!(!format!("{:?}", codec()).contains("secret"));
    }
}
