// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-core
//!
//! Domain model and store abstractions for the campus administration API.
//!
//! This crate provides:
//!
//! - **Types**: `Role`, `User`, `Course`, `CourseMark` and grade banding
//! - **Store**: async repository traits, including the `CredentialStore` read
//!   by the authentication core
//! - **Memory**: `MemoryStore`, the in-memory implementation of every trait
//! - **Clock**: injectable time sources for deterministic expiry tests
//! - **Error**: the domain error hierarchy
//!
//! ## Example
//!
//! ```rust,ignore
//! use campus_core::{MemoryStore, NewUser, Role, UserRepository};
//!
//! let store = MemoryStore::new();
//! let alice = store
//!     .create_user(NewUser::new("alice", phc_hash, Role::Teacher))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod clock;
pub mod error;
pub mod memory;
pub mod store;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult, DomainError, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{
    CourseRepository, CredentialStore, EnrollmentRepository, MarkRepository, Store,
    UserRepository,
};
pub use types::{
    Course, CourseMark, CourseUpdate, Grade, MarkComponent, NewCourse, NewUser, Role, User,
    UserUpdate, UserView,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
