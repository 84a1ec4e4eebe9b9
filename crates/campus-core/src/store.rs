// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Store traits.
//!
//! The authentication core reads identities through [`CredentialStore`] only.
//! The remaining repositories back the administrative CRUD surface.
//!
//! # Design Principles
//!
//! - **Async First**: every operation is async so a networked backend can
//!   be dropped in without changing callers.
//! - **Cancellation Safe**: lookups have no side effects, so dropping the
//!   future mid-flight leaves nothing to clean up.
//! - **Object Safe**: traits are used as `Arc<dyn Trait>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use campus_core::{CredentialStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let user = store.get_by_username("alice").await?;
//! ```

use std::fmt::Debug;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::{
    Course, CourseMark, CourseUpdate, MarkComponent, NewCourse, NewUser, Role, User, UserUpdate,
};

// =============================================================================
// CredentialStore
// =============================================================================

/// Read-only identity lookup used by the authenticator.
#[async_trait]
pub trait CredentialStore: Send + Sync + Debug {
    /// Looks up a user by username.
    ///
    /// Returns `StoreError::NotFound` if no such user exists.
    async fn get_by_username(&self, username: &str) -> StoreResult<User>;
}

// =============================================================================
// UserRepository
// =============================================================================

/// User management.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Lists all users ordered by creation time.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Lists users holding `role`.
    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>>;

    /// Gets a user by id.
    async fn get_user(&self, id: Uuid) -> StoreResult<User>;

    /// Creates a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Applies a partial update.
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StoreResult<User>;

    /// Deletes a user together with its enrollments, assignments and marks.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
}

// =============================================================================
// CourseRepository
// =============================================================================

/// Course management.
#[async_trait]
pub trait CourseRepository: Send + Sync + Debug {
    /// Lists all courses.
    async fn list_courses(&self) -> StoreResult<Vec<Course>>;

    /// Gets a course by id.
    async fn get_course(&self, id: Uuid) -> StoreResult<Course>;

    /// Creates a course. Fails with `Conflict` if the code is taken.
    async fn create_course(&self, course: NewCourse) -> StoreResult<Course>;

    /// Applies a partial update.
    async fn update_course(&self, id: Uuid, update: CourseUpdate) -> StoreResult<Course>;

    /// Deletes a course together with its enrollments, assignments and marks.
    async fn delete_course(&self, id: Uuid) -> StoreResult<()>;
}

// =============================================================================
// EnrollmentRepository
// =============================================================================

/// Student enrollments and teaching assignments.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync + Debug {
    /// Enrolls a student in a course. Enrolling twice is a `Conflict`.
    async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<()>;

    /// Students enrolled in a course.
    async fn students_of(&self, course_id: Uuid) -> StoreResult<Vec<User>>;

    /// Courses a student is enrolled in.
    async fn courses_of(&self, student_id: Uuid) -> StoreResult<Vec<Course>>;

    /// Assigns a teacher to a course. Assigning twice is a `Conflict`.
    async fn assign_teacher(&self, teacher_id: Uuid, course_id: Uuid) -> StoreResult<()>;

    /// Teachers assigned to a course.
    async fn teachers_of(&self, course_id: Uuid) -> StoreResult<Vec<User>>;

    /// Courses a teacher is assigned to.
    async fn courses_taught_by(&self, teacher_id: Uuid) -> StoreResult<Vec<Course>>;

    /// Returns `true` if the teacher is assigned to the course.
    async fn is_teacher_of(&self, teacher_id: Uuid, course_id: Uuid) -> StoreResult<bool>;

    /// Returns `true` if the student is enrolled in the course.
    async fn is_enrolled(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<bool>;
}

// =============================================================================
// MarkRepository
// =============================================================================

/// Course marks.
#[async_trait]
pub trait MarkRepository: Send + Sync + Debug {
    /// Sets one component of a student's mark, creating the sheet if needed.
    ///
    /// The value must already be validated against the component bounds.
    async fn upsert_mark(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        course_id: Uuid,
        component: MarkComponent,
        value: f64,
    ) -> StoreResult<CourseMark>;

    /// All marks of a student.
    async fn marks_for_student(&self, student_id: Uuid) -> StoreResult<Vec<CourseMark>>;

    /// All marks in a course.
    async fn marks_for_course(&self, course_id: Uuid) -> StoreResult<Vec<CourseMark>>;
}

/// Every repository the HTTP surface needs, as one object.
pub trait Store:
    CredentialStore + UserRepository + CourseRepository + EnrollmentRepository + MarkRepository
{
}

impl<T> Store for T where
    T: CredentialStore + UserRepository + CourseRepository + EnrollmentRepository + MarkRepository
{
}
