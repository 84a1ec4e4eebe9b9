// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-bin
//!
//! Command-line entry point for the campus administration API.
//!
//! This crate provides:
//!
//! - CLI argument parsing with clap
//! - Runtime orchestration (policy loading, account seeding, serving)
//! - Graceful shutdown handling
//! - Logging initialization
//! - Command implementations (run, validate, hash-password, version)
//!
//! ## Architecture
//!
//! ```text
//!                    main.rs
//!                       │
//!                    cli.rs
//!                       │
//!          ┌────────────┼────────────┐
//!          ▼            ▼            ▼
//!      commands      runtime      logging
//!                       │
//!                   shutdown
//!                       │
//!         campus-api / campus-config / campus-core
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! campus -c /etc/campus/campus.yaml
//!
//! # Validate configuration and policy files
//! campus validate --show-config
//!
//! # Hash a password for a bootstrap account
//! campus hash-password 's3cret'
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{CampusRuntime, RuntimeBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
