// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User administration handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use campus_core::{NewUser, Role, UserUpdate, UserView};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, PathParams, ValidatedJson};
use crate::response::Created;
use crate::state::AppState;

/// Query parameters for listing users.
#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    /// Only users with this role.
    pub role: Option<Role>,
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Json<Vec<UserView>>> {
    let users = match filter.role {
        Some(role) => state.store().list_users_by_role(role).await?,
        None => state.store().list_users().await?,
    };
    Ok(Json(users.iter().map(UserView::from).collect()))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<UserView>> {
    let user = state.store().get_user(id).await?;
    Ok(Json(user.view()))
}

/// Account creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Username.
    pub username: String,
    /// Initial password.
    pub password: String,
    /// Role.
    pub role: Role,
    /// First name.
    #[serde(default)]
    pub firstname: String,
    /// Last name.
    #[serde(default)]
    pub lastname: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Date of birth.
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
}

/// POST /api/users
///
/// Creates an account with any role.
pub async fn create_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::EmptyInput);
    }

    let hash = state.hasher().hash(&request.password)?;
    let mut new_user = NewUser::new(username, hash, request.role)
        .with_name(request.firstname, request.lastname)
        .with_email(request.email);
    new_user.birthdate = request.birthdate;

    let user = state.store().create_user(new_user).await?;
    tracing::info!(by = %ctx.subject, user = %user.username, role = %user.role, "User created");
    Ok(Created(user.view()))
}

/// Account update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// Profile and role changes.
    #[serde(flatten)]
    pub update: UserUpdate,
    /// New password.
    #[serde(default)]
    pub password: Option<String>,
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserView>> {
    let mut update = request.update;
    if let Some(password) = request.password {
        update.password_hash = Some(state.hasher().hash(&password)?);
    }

    let user = state.store().update_user(id, update).await?;
    tracing::info!(by = %ctx.subject, user = %user.username, "User updated");
    Ok(Json(user.view()))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    state.store().delete_user(id).await?;
    tracing::info!(by = %ctx.subject, user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
