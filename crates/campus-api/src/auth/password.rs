// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
//! verification reads the cost parameters from the stored value and keeps
//! working after the configured cost changes. A stored value that is not a
//! PHC string is rejected as [`PasswordError::MalformedHash`].

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use super::error::PasswordError;

// =============================================================================
// HasherConfig
// =============================================================================

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HasherConfig {
    /// Minimal cost, for tests only.
    pub fn for_testing() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn params(&self) -> Result<Params, PasswordError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordError::Params(e.to_string()))
    }
}

// =============================================================================
// PasswordHasher
// =============================================================================

/// One-way password hashing and verification.
#[derive(Clone)]
pub struct PasswordHasher {
    config: HasherConfig,
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Creates a hasher with the given cost.
    pub fn new(config: HasherConfig) -> Result<Self, PasswordError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, config.params()?);
        Ok(Self { config, argon2 })
    }

    /// Creates a hasher with minimal cost.
    pub fn for_testing() -> Self {
        let config = HasherConfig::for_testing();
        Self {
            config,
            argon2: Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::new(config.memory_kib, config.iterations, config.parallelism, None)
                    .unwrap_or_default(),
            ),
        }
    }

    /// Hashes `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.is_empty() {
            return Err(PasswordError::EmptyInput);
        }
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Runs one Argon2 evaluation at the configured cost and discards it.
    ///
    /// Stands in for [`verify`](Self::verify) when there is no stored hash,
    /// so a missing account costs the same time as a wrong password.
    pub fn verify_dummy(&self, plaintext: &str) {
        let salt = SaltString::generate(&mut OsRng);
        let _ = self.argon2.hash_password(plaintext.as_bytes(), &salt);
    }

    /// Verifies `plaintext` against a stored PHC hash.
    ///
    /// Returns `Ok(false)` on mismatch. The comparison is constant-time.
    pub fn verify(&self, hash: &str, plaintext: &str) -> Result<bool, PasswordError> {
        if hash.is_empty() || plaintext.is_empty() {
            return Err(PasswordError::EmptyInput);
        }
        let parsed =
            PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(e) => Err(PasswordError::Hashing(e.to_string())),
        }
    }

    /// Returns the configured cost.
    pub fn config(&self) -> HasherConfig {
        self.config
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("algorithm", &"argon2id")
            .field("config", &self.config)
            .finish()
    }
}

/// Returns `true` if `value` parses as a PHC hash string.
pub fn is_phc_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}

// =============================================================================
// Tests
// =============================================================================
