// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Course handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use campus_core::{Course, CourseUpdate, NewCourse, UserView};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{PathParams, ValidatedJson};
use crate::response::Created;
use crate::state::AppState;

/// GET /courses
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.store().list_courses().await?))
}

/// GET /courses/{id}
pub async fn get_course(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Course>> {
    Ok(Json(state.store().get_course(id).await?))
}

/// POST /courses
pub async fn create_course(
    State(state): State<AppState>,
    ValidatedJson(course): ValidatedJson<NewCourse>,
) -> ApiResult<impl IntoResponse> {
    if course.name.trim().is_empty() || course.code.trim().is_empty() {
        return Err(ApiError::validation("course name and code are required"));
    }

    let course = state.store().create_course(course).await?;
    tracing::info!(code = %course.code, id = %course.id, "Course created");
    Ok(Created(course))
}

/// PUT /courses/{id}
pub async fn update_course(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(update): ValidatedJson<CourseUpdate>,
) -> ApiResult<Json<Course>> {
    Ok(Json(state.store().update_course(id, update).await?))
}

/// DELETE /courses/{id}
///
/// Also drops the course's enrollments, assignments and marks.
pub async fn delete_course(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    state.store().delete_course(id).await?;
    tracing::info!(id = %id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /courses/{id}/students
pub async fn course_students(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Vec<UserView>>> {
    let students = state.store().students_of(id).await?;
    Ok(Json(students.iter().map(UserView::from).collect()))
}

/// GET /courses/{id}/teachers
pub async fn course_teachers(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Vec<UserView>>> {
    let teachers = state.store().teachers_of(id).await?;
    Ok(Json(teachers.iter().map(UserView::from).collect()))
}
