// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory store implementation.
//!
//! [`MemoryStore`] implements every store trait. It is the only persistence
//! backend; records are lost when the process exits.
//!
//! # Thread Safety
//!
//! Users, courses and marks live in `DashMap`s. Enrollment and teaching
//! relations are small sets guarded by a `parking_lot::RwLock`. Username and
//! course-code uniqueness is enforced through index maps using the entry API,
//! so two concurrent creates of the same name cannot both succeed.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::store::{
    CourseRepository, CredentialStore, EnrollmentRepository, MarkRepository, UserRepository,
};
use crate::types::{
    Course, CourseMark, CourseUpdate, MarkComponent, NewCourse, NewUser, Role, User, UserUpdate,
};

// =============================================================================
// MemoryStore
// =============================================================================

/// An in-memory implementation of every repository.
#[derive(Debug)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    usernames: DashMap<String, Uuid>,
    courses: DashMap<Uuid, Course>,
    course_codes: DashMap<String, Uuid>,
    /// (student_id, course_id)
    enrollments: RwLock<HashSet<(Uuid, Uuid)>>,
    /// (teacher_id, course_id)
    assignments: RwLock<HashSet<(Uuid, Uuid)>>,
    /// Keyed by (student_id, course_id).
    marks: DashMap<(Uuid, Uuid), CourseMark>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamping records with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: DashMap::new(),
            usernames: DashMap::new(),
            courses: DashMap::new(),
            course_codes: DashMap::new(),
            enrollments: RwLock::new(HashSet::new()),
            assignments: RwLock::new(HashSet::new()),
            marks: DashMap::new(),
            clock,
        }
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn user_with_role(&self, id: Uuid, role: Role) -> StoreResult<User> {
        let user = self
            .users
            .get(&id)
            .map(|u| u.value().clone())
            .ok_or_else(|| StoreError::not_found("user", id))?;
        if user.role != role {
            return Err(StoreError::invalid(format!(
                "user {} is a {}, not a {}",
                user.username, user.role, role
            )));
        }
        Ok(user)
    }

    fn require_course(&self, id: Uuid) -> StoreResult<()> {
        if self.courses.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::not_found("course", id))
        }
    }

    fn users_by_ids(&self, ids: impl Iterator<Item = Uuid>) -> Vec<User> {
        let mut users: Vec<User> = ids
            .filter_map(|id| self.users.get(&id).map(|u| u.value().clone()))
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    fn courses_by_ids(&self, ids: impl Iterator<Item = Uuid>) -> Vec<Course> {
        let mut courses: Vec<Course> = ids
            .filter_map(|id| self.courses.get(&id).map(|c| c.value().clone()))
            .collect();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        courses
    }
}

// =============================================================================
// Trait implementations
// =============================================================================

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get_by_username(&self, username: &str) -> StoreResult<User> {
        let id = self
            .usernames
            .get(username)
            .map(|id| *id)
            .ok_or_else(|| StoreError::not_found("user", username))?;
        self.users
            .get(&id)
            .map(|u| u.value().clone())
            .ok_or_else(|| StoreError::not_found("user", username))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let mut users = self.list_users().await?;
        users.retain(|u| u.role == role);
        Ok(users)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.users
            .get(&id)
            .map(|u| u.value().clone())
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        if user.username.trim().is_empty() {
            return Err(StoreError::invalid("username must not be empty"));
        }
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::conflict("user", &user.username)),
            Entry::Vacant(slot) => {
                let user = user.into_user(self.clock.now());
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                debug!(user = %user.username, role = %user.role, "User created");
                Ok(user)
            }
        }
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StoreResult<User> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        update.apply(&mut user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let (_, user) = self
            .users
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        self.usernames.remove(&user.username);
        self.enrollments.write().retain(|(student, _)| *student != id);
        self.assignments.write().retain(|(teacher, _)| *teacher != id);
        self.marks.retain(|(student, _), _| *student != id);
        debug!(user = %user.username, "User deleted");
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        let ids: Vec<Uuid> = self.courses.iter().map(|c| *c.key()).collect();
        Ok(self.courses_by_ids(ids.into_iter()))
    }

    async fn get_course(&self, id: Uuid) -> StoreResult<Course> {
        self.courses
            .get(&id)
            .map(|c| c.value().clone())
            .ok_or_else(|| StoreError::not_found("course", id))
    }

    async fn create_course(&self, course: NewCourse) -> StoreResult<Course> {
        if course.code.trim().is_empty() || course.name.trim().is_empty() {
            return Err(StoreError::invalid("course name and code must not be empty"));
        }
        match self.course_codes.entry(course.code.clone()) {
            Entry::Occupied(_) => Err(StoreError::conflict("course", &course.code)),
            Entry::Vacant(slot) => {
                let course = course.into_course(self.clock.now());
                slot.insert(course.id);
                self.courses.insert(course.id, course.clone());
                Ok(course)
            }
        }
    }

    async fn update_course(&self, id: Uuid, update: CourseUpdate) -> StoreResult<Course> {
        let new_code = update.code.clone();
        let mut course = self
            .courses
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("course", id))?;

        if let Some(code) = new_code.filter(|c| *c != course.code) {
            match self.course_codes.entry(code.clone()) {
                Entry::Occupied(_) => return Err(StoreError::conflict("course", code)),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.course_codes.remove(&course.code);
        }

        update.apply(&mut course);
        Ok(course.clone())
    }

    async fn delete_course(&self, id: Uuid) -> StoreResult<()> {
        let (_, course) = self
            .courses
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("course", id))?;
        self.course_codes.remove(&course.code);
        self.enrollments.write().retain(|(_, c)| *c != id);
        self.assignments.write().retain(|(_, c)| *c != id);
        self.marks.retain(|(_, c), _| *c != id);
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<()> {
        self.user_with_role(student_id, Role::Student)?;
        self.require_course(course_id)?;
        if !self.enrollments.write().insert((student_id, course_id)) {
            return Err(StoreError::conflict(
                "enrollment",
                format!("{student_id}/{course_id}"),
            ));
        }
        Ok(())
    }

    async fn students_of(&self, course_id: Uuid) -> StoreResult<Vec<User>> {
        self.require_course(course_id)?;
        let ids: Vec<Uuid> = self
            .enrollments
            .read()
            .iter()
            .filter(|(_, c)| *c == course_id)
            .map(|(s, _)| *s)
            .collect();
        Ok(self.users_by_ids(ids.into_iter()))
    }

    async fn courses_of(&self, student_id: Uuid) -> StoreResult<Vec<Course>> {
        self.user_with_role(student_id, Role::Student)?;
        let ids: Vec<Uuid> = self
            .enrollments
            .read()
            .iter()
            .filter(|(s, _)| *s == student_id)
            .map(|(_, c)| *c)
            .collect();
        Ok(self.courses_by_ids(ids.into_iter()))
    }

    async fn assign_teacher(&self, teacher_id: Uuid, course_id: Uuid) -> StoreResult<()> {
        self.user_with_role(teacher_id, Role::Teacher)?;
        self.require_course(course_id)?;
        if !self.assignments.write().insert((teacher_id, course_id)) {
            return Err(StoreError::conflict(
                "assignment",
                format!("{teacher_id}/{course_id}"),
            ));
        }
        Ok(())
    }

    async fn teachers_of(&self, course_id: Uuid) -> StoreResult<Vec<User>> {
        self.require_course(course_id)?;
        let ids: Vec<Uuid> = self
            .assignments
            .read()
            .iter()
            .filter(|(_, c)| *c == course_id)
            .map(|(t, _)| *t)
            .collect();
        Ok(self.users_by_ids(ids.into_iter()))
    }

    async fn courses_taught_by(&self, teacher_id: Uuid) -> StoreResult<Vec<Course>> {
        self.user_with_role(teacher_id, Role::Teacher)?;
        let ids: Vec<Uuid> = self
            .assignments
            .read()
            .iter()
            .filter(|(t, _)| *t == teacher_id)
            .map(|(_, c)| *c)
            .collect();
        Ok(self.courses_by_ids(ids.into_iter()))
    }

    async fn is_teacher_of(&self, teacher_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        Ok(self.assignments.read().contains(&(teacher_id, course_id)))
    }

    async fn is_enrolled(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        Ok(self.enrollments.read().contains(&(student_id, course_id)))
    }
}

#[async_trait]
impl MarkRepository for MemoryStore {
    async fn upsert_mark(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        course_id: Uuid,
        component: MarkComponent,
        value: f64,
    ) -> StoreResult<CourseMark> {
        let now = self.clock.now();
        let mut mark = self
            .marks
            .entry((student_id, course_id))
            .or_insert_with(|| CourseMark::new(student_id, course_id, teacher_id, now));
        mark.teacher_id = teacher_id;
        mark.set(component, value);
        mark.updated_at = now;
        Ok(mark.clone())
    }

    async fn marks_for_student(&self, student_id: Uuid) -> StoreResult<Vec<CourseMark>> {
        let mut marks: Vec<CourseMark> = self
            .marks
            .iter()
            .filter(|m| m.student_id == student_id)
            .map(|m| m.value().clone())
            .collect();
        marks.sort_by_key(|m| m.course_id);
        Ok(marks)
    }

    async fn marks_for_course(&self, course_id: Uuid) -> StoreResult<Vec<CourseMark>> {
        let mut marks: Vec<CourseMark> = self
            .marks
            .iter()
            .filter(|m| m.course_id == course_id)
            .map(|m| m.value().clone())
            .collect();
        marks.sort_by_key(|m| m.student_id);
        Ok(marks)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Grade;

    fn new_course(code: &str) -> NewCourse {
        NewCourse {
            name: format!("Course {code}"),
            code: code.to_string(),
            faculty: "Science".to_string(),
            description: None,
            credits: 5,
        }
    }

    #[tokio::test]
    async fn test_username_is_unique() {
        let store = MemoryStore::new();
        store
            .create_user(NewUser::new("alice", "h1", Role::Teacher))
            .await
            .unwrap();

        let err = store
            .create_user(NewUser::new("alice", "h2", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_get_by_username() {
        let store = MemoryStore::new();
        let created = store
            .create_user(NewUser::new("alice", "hash", Role::Teacher))
            .await
            .unwrap();

        let found = store.get_by_username("alice").await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "hash");

        let err = store.get_by_username("mallory").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_by_role() {
        let store = MemoryStore::new();
        store.create_user(NewUser::new("t1", "h", Role::Teacher)).await.unwrap();
        store.create_user(NewUser::new("s1", "h", Role::Student)).await.unwrap();
        store.create_user(NewUser::new("s2", "h", Role::Student)).await.unwrap();

        let students = store.list_users_by_role(Role::Student).await.unwrap();
        assert_eq!(students.len(), 2);
        assert!(students.iter().all(|u| u.role == Role::Student));
    }

    #[tokio::test]
    async fn test_enrollment_requires_student() {
        let store = MemoryStore::new();
        let teacher = store.create_user(NewUser::new("t", "h", Role::Teacher)).await.unwrap();
        let student = store.create_user(NewUser::new("s", "h", Role::Student)).await.unwrap();
        let course = store.create_course(new_course("CS101")).await.unwrap();

        assert!(matches!(
            store.enroll(teacher.id, course.id).await,
            Err(StoreError::Invalid { .. })
        ));

        store.enroll(student.id, course.id).await.unwrap();
        assert!(store.is_enrolled(student.id, course.id).await.unwrap());
        assert!(matches!(
            store.enroll(student.id, course.id).await,
            Err(StoreError::Conflict { .. })
        ));

        let students = store.students_of(course.id).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].username, "s");
    }

    #[tokio::test]
    async fn test_teacher_assignment() {
        let store = MemoryStore::new();
        let teacher = store.create_user(NewUser::new("t", "h", Role::Teacher)).await.unwrap();
        let course = store.create_course(new_course("CS102")).await.unwrap();

        assert!(!store.is_teacher_of(teacher.id, course.id).await.unwrap());
        store.assign_teacher(teacher.id, course.id).await.unwrap();
        assert!(store.is_teacher_of(teacher.id, course.id).await.unwrap());

        let taught = store.courses_taught_by(teacher.id).await.unwrap();
        assert_eq!(taught[0].code, "CS102");
    }

    #[tokio::test]
    async fn test_upsert_mark_accumulates_components() {
        let store = MemoryStore::new();
        let (t, s, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

        store
            .upsert_mark(t, s, c, MarkComponent::FirstAttestation, 25.0)
            .await
            .unwrap();
        store
            .upsert_mark(t, s, c, MarkComponent::SecondAttestation, 25.0)
            .await
            .unwrap();
        let mark = store
            .upsert_mark(t, s, c, MarkComponent::FinalExam, 35.0)
            .await
            .unwrap();

        assert_eq!(mark.total, 85.0);
        assert_eq!(mark.grade, Grade::AMinus);
        assert_eq!(store.marks_for_student(s).await.unwrap().len(), 1);
        assert_eq!(store.marks_for_course(c).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_course_cascades() {
        let store = MemoryStore::new();
        let student = store.create_user(NewUser::new("s", "h", Role::Student)).await.unwrap();
        let course = store.create_course(new_course("CS103")).await.unwrap();
        store.enroll(student.id, course.id).await.unwrap();

        store.delete_course(course.id).await.unwrap();
        assert!(!store.is_enrolled(student.id, course.id).await.unwrap());
        assert!(store.courses_of(student.id).await.unwrap().is_empty());

        // The code is free again.
        store.create_course(new_course("CS103")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_course_code_conflict() {
        let store = MemoryStore::new();
        store.create_course(new_course("A1")).await.unwrap();
        let b = store.create_course(new_course("B1")).await.unwrap();

        let err = store
            .update_course(
                b.id,
                CourseUpdate {
                    code: Some("A1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }
}
