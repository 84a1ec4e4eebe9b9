// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Argon2id password hashing
//! - Session token issuance and verification
//! - Login and refresh orchestration
//! - The policy engine
//! - Authentication context

mod authenticator;
mod claims;
mod context;
mod error;
mod jwt;
mod password;
pub mod policy;

pub use authenticator::{Authenticator, TokenPair};
pub use claims::{Claims, TokenKind};
pub use context::AuthContext;
pub use error::{AuthError, PasswordError, PolicyError, TokenError};
pub use jwt::{
    is_hmac, KeyConfig, TokenCodec, TokenConfig, DEFAULT_ACCESS_LIFETIME,
    DEFAULT_REFRESH_LIFETIME,
};
pub use password::{is_phc_hash, HasherConfig, PasswordHasher};
pub use policy::{PolicyEngine, PolicyRule, PolicySource, RoleAssignment};

pub use jsonwebtoken::Algorithm;
