// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-api
//!
//! HTTP API server and security core for the campus administration service.
//!
//! This crate provides:
//!
//! - **Auth**: Argon2id password hashing, signed access and refresh tokens,
//!   the login/refresh [`Authenticator`](auth::Authenticator) and the
//!   policy engine
//! - **Middleware**: bearer token authentication, policy enforcement and
//!   per-route role allow-lists
//! - **Handlers**: accounts, courses, enrollment, teaching assignments, marks
//!   and policy administration
//! - **Server**: the Axum router with tracing, compression, timeouts and CORS
//!
//! ## Example
//!
//! ```rust,ignore
//! use campus_api::{ApiServer, AppState};
//! use campus_api::auth::TokenConfig;
//!
//! let state = AppState::builder()
//!     .token_config(TokenConfig::new(access_secret, refresh_secret))
//!     .store(store)
//!     .build()?;
//!
//! ApiServer::new(state).run_with_shutdown(shutdown).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ApiConfig, CorsConfig};
pub use error::{ApiError, ApiResult};
pub use server::ApiServer;
pub use state::{AppState, AppStateBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
