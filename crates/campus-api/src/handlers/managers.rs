// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Manager handlers.

use axum::{extract::State, response::IntoResponse, Json};
use campus_core::{Role, UserView};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extractors::{Auth, PathParams};
use crate::response::{Created, MessageResponse};
use crate::state::AppState;

/// GET /managers
pub async fn list_managers(State(state): State<AppState>) -> ApiResult<Json<Vec<UserView>>> {
    let managers = state.store().list_users_by_role(Role::Manager).await?;
    Ok(Json(managers.iter().map(UserView::from).collect()))
}

/// Path parameters for a teaching assignment.
#[derive(Debug, Deserialize)]
pub struct AssignmentPath {
    /// Teacher to assign.
    pub teacher_id: Uuid,
    /// Course to teach.
    pub course_id: Uuid,
}

/// POST /managers/teachers/{teacher_id}/courses/{course_id}
pub async fn assign_teacher(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathParams(path): PathParams<AssignmentPath>,
) -> ApiResult<impl IntoResponse> {
    state
        .store()
        .assign_teacher(path.teacher_id, path.course_id)
        .await?;
    tracing::info!(
        by = %ctx.subject,
        teacher_id = %path.teacher_id,
        course_id = %path.course_id,
        "Teacher assigned"
    );
    Ok(Created(MessageResponse::new("teacher assigned")))
}
