// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, response::IntoResponse, Json};
use campus_core::{NewUser, Role, User, UserView};
use serde::Deserialize;

use crate::auth::{AuthContext, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::{AccessTokenResponse, Created};
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// POST /login
///
/// Verifies credentials and returns an access and refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let now = state.clock().now();
    let pair = state
        .auth()
        .login(&request.username, &request.password, now)
        .await?;
    Ok(Json(pair))
}

// =============================================================================
// Refresh
// =============================================================================

/// Refresh token request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

/// POST /refresh
///
/// Exchanges a valid refresh token for a new access token. The refresh token
/// stays valid until its own expiry.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<AccessTokenResponse>> {
    let now = state.clock().now();
    let access_token = state.auth().refresh(&request.refresh_token, now)?;
    Ok(Json(AccessTokenResponse { access_token }))
}

// =============================================================================
// Register
// =============================================================================

/// Self-registration request body.
///
/// There is no role field: registered accounts are always students.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
    /// First name.
    #[serde(default)]
    pub firstname: String,
    /// Last name.
    #[serde(default)]
    pub lastname: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
}

/// POST /register
///
/// Creates a student account.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::EmptyInput);
    }

    let hash = state.hasher().hash(&request.password)?;
    let user = state
        .store()
        .create_user(
            NewUser::new(username, hash, Role::Student)
                .with_name(request.firstname, request.lastname)
                .with_email(request.email),
        )
        .await?;

    tracing::info!(user = %user.username, "Student registered");
    Ok(Created(user.view()))
}

// =============================================================================
// Current User
// =============================================================================

/// GET /api/me
///
/// Returns the authenticated user's profile.
pub async fn me(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<Json<UserView>> {
    let user = current_user(&state, &ctx).await?;
    Ok(Json(user.view()))
}

/// Resolves the user behind a verified token.
///
/// A token can outlive its account; that case is reported as 401.
pub(crate) async fn current_user(state: &AppState, ctx: &AuthContext) -> ApiResult<User> {
    match state.store().get_by_username(&ctx.subject).await {
        Ok(user) => Ok(user),
        Err(e) if e.is_not_found() => {
            tracing::warn!(user = %ctx.subject, "Token subject no longer exists");
            Err(ApiError::InvalidCredentials)
        }
        Err(e) => Err(e.into()),
    }
}
