// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Domain types for the campus administration service.
//!
//! # Overview
//!
//! - [`Role`]: the fixed set of role labels carried by identities and tokens
//! - [`User`]: an identity with its password hash and role
//! - [`UserView`]: the serializable projection of a user, without the hash
//! - [`Course`]: a course offered by a faculty
//! - [`CourseMark`]: the three graded components of a student's course result
//! - [`Grade`]: letter grade derived from a mark total

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

// =============================================================================
// Role
// =============================================================================

/// Role label attached to every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Academic office staff.
    Manager,
    /// Teaching staff.
    Teacher,
    /// Enrolled student.
    Student,
}

impl Role {
    /// Returns the canonical label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Returns every role.
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Manager, Role::Teacher, Role::Student]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A stored identity.
///
/// Not serializable; responses use [`UserView`], which has no hash field.
#[derive(Debug, Clone)]
pub struct User {
    /// Opaque identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Password hash in PHC string format.
    pub password_hash: String,
    /// Given name.
    pub firstname: String,
    /// Family name.
    pub lastname: String,
    /// Contact email.
    pub email: String,
    /// Role label.
    pub role: Role,
    /// Date of birth.
    pub birthdate: Option<NaiveDate>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the public projection of this user.
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// Public projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    /// Opaque identifier.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Given name.
    pub firstname: String,
    /// Family name.
    pub lastname: String,
    /// Contact email.
    pub email: String,
    /// Role label.
    pub role: Role,
    /// Date of birth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            email: user.email.clone(),
            role: user.role,
            birthdate: user.birthdate,
            created_at: user.created_at,
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Password hash in PHC string format.
    pub password_hash: String,
    /// Given name.
    pub firstname: String,
    /// Family name.
    pub lastname: String,
    /// Contact email.
    pub email: String,
    /// Role label.
    pub role: Role,
    /// Date of birth.
    pub birthdate: Option<NaiveDate>,
}

impl NewUser {
    /// Creates a user input with empty profile fields.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            firstname: String::new(),
            lastname: String::new(),
            email: String::new(),
            role,
            birthdate: None,
        }
    }

    /// Sets the given and family names.
    pub fn with_name(mut self, firstname: impl Into<String>, lastname: impl Into<String>) -> Self {
        self.firstname = firstname.into();
        self.lastname = lastname.into();
        self
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Materializes the user with a fresh identifier.
    pub fn into_user(self, created_at: DateTime<Utc>) -> User {
        User {
            id: Uuid::now_v7(),
            username: self.username,
            password_hash: self.password_hash,
            firstname: self.firstname,
            lastname: self.lastname,
            email: self.email,
            role: self.role,
            birthdate: self.birthdate,
            created_at,
        }
    }
}

/// Partial update of a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// New given name.
    pub firstname: Option<String>,
    /// New family name.
    pub lastname: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New date of birth.
    pub birthdate: Option<NaiveDate>,
    /// New password hash. Never deserialized from request bodies.
    #[serde(skip)]
    pub password_hash: Option<String>,
}

impl UserUpdate {
    /// Applies the update in place.
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.firstname {
            user.firstname = v;
        }
        if let Some(v) = self.lastname {
            user.lastname = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.role {
            user.role = v;
        }
        if let Some(v) = self.birthdate {
            user.birthdate = Some(v);
        }
        if let Some(v) = self.password_hash {
            user.password_hash = v;
        }
    }
}

// =============================================================================
// Course
// =============================================================================

/// A course offered by a faculty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Opaque identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Catalogue code.
    pub code: String,
    /// Owning faculty.
    pub faculty: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Credit value.
    pub credits: u8,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a course.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    /// Display name.
    pub name: String,
    /// Catalogue code.
    pub code: String,
    /// Owning faculty.
    pub faculty: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Credit value.
    #[serde(default)]
    pub credits: u8,
}

impl NewCourse {
    /// Materializes the course with a fresh identifier.
    pub fn into_course(self, created_at: DateTime<Utc>) -> Course {
        Course {
            id: Uuid::now_v7(),
            name: self.name,
            code: self.code,
            faculty: self.faculty,
            description: self.description,
            credits: self.credits,
            created_at,
        }
    }
}

/// Partial update of a course.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseUpdate {
    /// New name.
    pub name: Option<String>,
    /// New code.
    pub code: Option<String>,
    /// New faculty.
    pub faculty: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New credit value.
    pub credits: Option<u8>,
}

impl CourseUpdate {
    /// Applies the update in place.
    pub fn apply(self, course: &mut Course) {
        if let Some(v) = self.name {
            course.name = v;
        }
        if let Some(v) = self.code {
            course.code = v;
        }
        if let Some(v) = self.faculty {
            course.faculty = v;
        }
        if let Some(v) = self.description {
            course.description = Some(v);
        }
        if let Some(v) = self.credits {
            course.credits = v;
        }
    }
}

// =============================================================================
// Marks
// =============================================================================

/// One graded component of a course result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkComponent {
    /// First mid-term attestation.
    FirstAttestation,
    /// Second mid-term attestation.
    SecondAttestation,
    /// Final examination.
    FinalExam,
}

impl MarkComponent {
    /// Returns the component name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkComponent::FirstAttestation => "first_attestation",
            MarkComponent::SecondAttestation => "second_attestation",
            MarkComponent::FinalExam => "final_exam",
        }
    }

    /// Maximum points for this component. The three maxima sum to 100.
    pub fn max(&self) -> f64 {
        match self {
            MarkComponent::FirstAttestation | MarkComponent::SecondAttestation => 30.0,
            MarkComponent::FinalExam => 40.0,
        }
    }

    /// Checks that `value` is within `0..=max`.
    pub fn validate(&self, value: f64) -> Result<f64, DomainError> {
        if value.is_finite() && (0.0..=self.max()).contains(&value) {
            Ok(value)
        } else {
            Err(DomainError::MarkOutOfRange {
                component: self.as_str(),
                value,
                max: self.max(),
            })
        }
    }
}

impl FromStr for MarkComponent {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_attestation" => Ok(MarkComponent::FirstAttestation),
            "second_attestation" => Ok(MarkComponent::SecondAttestation),
            "final_exam" => Ok(MarkComponent::FinalExam),
            other => Err(DomainError::UnknownComponent(other.to_string())),
        }
    }
}

/// Letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    /// 90 and above.
    #[serde(rename = "A")]
    A,
    /// 85..90.
    #[serde(rename = "A-")]
    AMinus,
    /// 80..85.
    #[serde(rename = "B+")]
    BPlus,
    /// 75..80.
    #[serde(rename = "B")]
    B,
    /// 70..75.
    #[serde(rename = "B-")]
    BMinus,
    /// 65..70.
    #[serde(rename = "C+")]
    CPlus,
    /// 60..65.
    #[serde(rename = "C")]
    C,
    /// 55..60.
    #[serde(rename = "C-")]
    CMinus,
    /// 50..55.
    #[serde(rename = "D")]
    D,
    /// Below 50.
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// Maps a mark total onto the grade bands.
    pub fn from_total(total: f64) -> Self {
        match total {
            t if t >= 90.0 => Grade::A,
            t if t >= 85.0 => Grade::AMinus,
            t if t >= 80.0 => Grade::BPlus,
            t if t >= 75.0 => Grade::B,
            t if t >= 70.0 => Grade::BMinus,
            t if t >= 65.0 => Grade::CPlus,
            t if t >= 60.0 => Grade::C,
            t if t >= 55.0 => Grade::CMinus,
            t if t >= 50.0 => Grade::D,
            _ => Grade::F,
        }
    }

    /// Returns the letter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student's result in one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseMark {
    /// Student identifier.
    pub student_id: Uuid,
    /// Course identifier.
    pub course_id: Uuid,
    /// Teacher who last graded.
    pub teacher_id: Uuid,
    /// First attestation points.
    pub first_attestation: f64,
    /// Second attestation points.
    pub second_attestation: f64,
    /// Final exam points.
    pub final_exam: f64,
    /// Sum of the three components.
    pub total: f64,
    /// Letter grade for `total`.
    pub grade: Grade,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

impl CourseMark {
    /// Creates an empty mark sheet.
    pub fn new(student_id: Uuid, course_id: Uuid, teacher_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            student_id,
            course_id,
            teacher_id,
            first_attestation: 0.0,
            second_attestation: 0.0,
            final_exam: 0.0,
            total: 0.0,
            grade: Grade::F,
            updated_at: now,
        }
    }

    /// Sets one component and recalculates the total and grade.
    pub fn set(&mut self, component: MarkComponent, value: f64) {
        match component {
            MarkComponent::FirstAttestation => self.first_attestation = value,
            MarkComponent::SecondAttestation => self.second_attestation = value,
            MarkComponent::FinalExam => self.final_exam = value,
        }
        self.recalculate();
    }

    /// Recomputes `total` and `grade` from the components.
    pub fn recalculate(&mut self) {
        self.total = self.first_attestation + self.second_attestation + self.final_exam;
        self.grade = Grade::from_total(self.total);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("dean".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let role: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(role, Role::Student);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(Grade::from_total(100.0), Grade::A);
        assert_eq!(Grade::from_total(90.0), Grade::A);
        assert_eq!(Grade::from_total(89.9), Grade::AMinus);
        assert_eq!(Grade::from_total(80.0), Grade::BPlus);
        assert_eq!(Grade::from_total(72.5), Grade::BMinus);
        assert_eq!(Grade::from_total(60.0), Grade::C);
        assert_eq!(Grade::from_total(50.0), Grade::D);
        assert_eq!(Grade::from_total(49.99), Grade::F);
        assert_eq!(Grade::AMinus.to_string(), "A-");
    }

    #[test]
    fn test_course_mark_recalculates() {
        let now = Utc::now();
        let mut mark = CourseMark::new(Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7(), now);
        mark.set(MarkComponent::FirstAttestation, 28.0);
        mark.set(MarkComponent::SecondAttestation, 27.0);
        assert_eq!(mark.total, 55.0);
        assert_eq!(mark.grade, Grade::CMinus);

        mark.set(MarkComponent::FinalExam, 36.0);
        assert_eq!(mark.total, 91.0);
        assert_eq!(mark.grade, Grade::A);
    }

    #[test]
    fn test_mark_component_bounds() {
        assert!(MarkComponent::FirstAttestation.validate(30.0).is_ok());
        assert!(MarkComponent::FirstAttestation.validate(30.5).is_err());
        assert!(MarkComponent::FinalExam.validate(40.0).is_ok());
        assert!(MarkComponent::FinalExam.validate(-1.0).is_err());
        assert!(MarkComponent::FinalExam.validate(f64::NAN).is_err());
    }

    #[test]
    fn test_user_view_hides_hash() {
        let user = NewUser::new("alice", "$argon2id$v=19$...", Role::Teacher)
            .with_name("Alice", "Liddell")
            .into_user(Utc::now());
        let json = serde_json::to_value(user.view()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "teacher");
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_user_update_applies_present_fields() {
        let mut user = NewUser::new("bob", "hash", Role::Student).into_user(Utc::now());
        UserUpdate {
            email: Some("bob@example.edu".into()),
            role: Some(Role::Teacher),
            ..Default::default()
        }
        .apply(&mut user);

        assert_eq!(user.email, "bob@example.edu");
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.password_hash, "hash");
    }
}
