// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Teacher handlers.

use axum::{extract::State, Json};
use campus_core::{Course, Role, UserView};
use uuid::Uuid;

use super::students::user_with_role;
use crate::error::ApiResult;
use crate::extractors::PathParams;
use crate::state::AppState;

/// GET /teachers
pub async fn list_teachers(State(state): State<AppState>) -> ApiResult<Json<Vec<UserView>>> {
    let teachers = state.store().list_users_by_role(Role::Teacher).await?;
    Ok(Json(teachers.iter().map(UserView::from).collect()))
}

/// GET /teachers/{id}
pub async fn get_teacher(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<UserView>> {
    let teacher = user_with_role(&state, id, Role::Teacher).await?;
    Ok(Json(teacher.view()))
}

/// GET /teachers/{id}/courses
pub async fn teacher_courses(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.store().courses_taught_by(id).await?))
}
