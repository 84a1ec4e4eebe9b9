// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Student handlers.

use axum::{extract::State, response::IntoResponse, Json};
use campus_core::{Course, Role, User, UserView};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, PathParams};
use crate::response::{Created, MessageResponse};
use crate::state::AppState;

/// Fetches a user and requires the given role.
///
/// A user with another role is reported as missing.
pub(crate) async fn user_with_role(state: &AppState, id: Uuid, role: Role) -> ApiResult<User> {
    let user = state.store().get_user(id).await?;
    if user.role != role {
        return Err(ApiError::not_found(role.as_str()));
    }
    Ok(user)
}

/// GET /students
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Json<Vec<UserView>>> {
    let students = state.store().list_users_by_role(Role::Student).await?;
    Ok(Json(students.iter().map(UserView::from).collect()))
}

/// GET /students/{id}
pub async fn get_student(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<UserView>> {
    let student = user_with_role(&state, id, Role::Student).await?;
    Ok(Json(student.view()))
}

/// Path parameters for enrollment.
#[derive(Debug, Deserialize)]
pub struct EnrollmentPath {
    /// Student to enroll.
    #[serde(rename = "id")]
    pub student_id: Uuid,
    /// Target course.
    pub course_id: Uuid,
}

/// POST /students/{id}/courses/{course_id}
pub async fn enroll_student(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathParams(path): PathParams<EnrollmentPath>,
) -> ApiResult<impl IntoResponse> {
    state.store().enroll(path.student_id, path.course_id).await?;
    tracing::info!(
        by = %ctx.subject,
        student_id = %path.student_id,
        course_id = %path.course_id,
        "Student enrolled"
    );
    Ok(Created(MessageResponse::new("student enrolled")))
}

/// GET /students/{id}/courses
pub async fn student_courses(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.store().courses_of(id).await?))
}
