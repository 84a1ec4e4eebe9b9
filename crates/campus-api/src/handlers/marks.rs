// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mark handlers.
//!
//! Teachers grade only their own courses, and only enrolled students.
//! Students may read their own marks and nobody else's.

use axum::{extract::State, Json};
use campus_core::{CourseMark, MarkComponent, Role};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::current_user;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, PathParams, ValidatedJson};
use crate::state::AppState;

/// Path parameters for grading.
#[derive(Debug, Deserialize)]
pub struct GradePath {
    /// Grading teacher.
    #[serde(rename = "id")]
    pub teacher_id: Uuid,
    /// Course.
    pub course_id: Uuid,
    /// Graded student.
    pub student_id: Uuid,
}

/// Grading request body.
#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    /// Which component to set.
    pub component: MarkComponent,
    /// Points for the component.
    pub value: f64,
}

/// POST /teachers/{id}/courses/{course_id}/students/{student_id}/marks
///
/// Sets one component of a student's mark and returns the recalculated mark.
pub async fn upsert_mark(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathParams(path): PathParams<GradePath>,
    ValidatedJson(request): ValidatedJson<MarkRequest>,
) -> ApiResult<Json<CourseMark>> {
    let teacher = current_user(&state, &ctx).await?;
    if teacher.id != path.teacher_id {
        tracing::warn!(user = %ctx.subject, teacher_id = %path.teacher_id, "Grading as another teacher");
        return Err(ApiError::forbidden("teachers may only grade as themselves"));
    }

    let store = state.store();
    if !store.is_teacher_of(teacher.id, path.course_id).await? {
        return Err(ApiError::forbidden("teacher is not assigned to this course"));
    }
    if !store.is_enrolled(path.student_id, path.course_id).await? {
        return Err(ApiError::bad_request("student is not enrolled in this course"));
    }

    let value = request.component.validate(request.value)?;
    let mark = store
        .upsert_mark(teacher.id, path.student_id, path.course_id, request.component, value)
        .await?;

    tracing::info!(
        teacher = %ctx.subject,
        student_id = %path.student_id,
        course_id = %path.course_id,
        component = request.component.as_str(),
        value,
        total = mark.total,
        "Mark recorded"
    );
    Ok(Json(mark))
}

/// GET /marks/student/{student_id}
pub async fn student_marks(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathParams(student_id): PathParams<Uuid>,
) -> ApiResult<Json<Vec<CourseMark>>> {
    if ctx.role == Role::Student {
        let me = current_user(&state, &ctx).await?;
        if me.id != student_id {
            return Err(ApiError::forbidden("students may only read their own marks"));
        }
    }
    Ok(Json(state.store().marks_for_student(student_id).await?))
}

/// GET /marks/course/{course_id}
pub async fn course_marks(
    State(state): State<AppState>,
    PathParams(course_id): PathParams<Uuid>,
) -> ApiResult<Json<Vec<CourseMark>>> {
    Ok(Json(state.store().marks_for_course(course_id).await?))
}
