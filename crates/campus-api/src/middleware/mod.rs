// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! Protected requests pass through, in order:
//!
//! - [`AuthMiddleware`]: access token verification
//! - [`PolicyMiddleware`]: policy engine enforcement (when enabled)
//! - [`RoleMiddleware`]: the route's static role allow-list

mod auth;
mod policy;
mod role;

pub use auth::{AuthLayer, AuthMiddleware, DEFAULT_PUBLIC_PATHS};
pub use policy::{PolicyLayer, PolicyMiddleware};
pub use role::{RoleLayer, RoleMiddleware};
