// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! This module contains the handler implementations for all API endpoints:
//!
//! - [`health`]: Health check endpoints
//! - [`auth`]: Login, refresh, registration and the current user
//! - [`users`]: Account administration
//! - [`courses`], [`students`], [`teachers`], [`managers`]: Course catalogue,
//!   enrollment and teaching assignments
//! - [`marks`]: Grading
//! - [`policies`]: Policy engine administration

mod auth;
mod courses;
mod health;
mod managers;
mod marks;
mod policies;
mod students;
mod teachers;
mod users;

pub use auth::*;
pub use courses::*;
pub use health::*;
pub use managers::*;
pub use marks::*;
pub use policies::*;
pub use students::*;
pub use teachers::*;
pub use users::*;
