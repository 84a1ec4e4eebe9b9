// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Campus Integration Tests
//!
//! Shared utilities and cross-crate test suites for the campus workspace.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p campus-tests
//! cargo test -p campus-tests --test integration_auth
//! cargo test -p campus-tests --test integration_policy
//! cargo test -p campus-tests --test integration_config
//! cargo test -p campus-tests --test integration_api
//! ```
//!
//! ## Test Categories
//!
//! - `integration_auth`: password hashing, token issuance, login and refresh
//! - `integration_policy`: the shipped policy files and the policy layer
//! - `integration_config`: loading, overrides and the sample configuration
//! - `integration_api`: end-to-end scenarios over the router
//!
//! ## Using the Harness
//!
//! ```rust,ignore
//! use campus_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new().await;
//!     let token = app.access_token(&AccountFixtures::alice()).await;
//!     app.call(RequestBuilder::get("/courses").bearer(token)).await.assert_ok();
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
}
