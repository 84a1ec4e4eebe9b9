// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Policy administration handlers.
//!
//! Mutations apply to the running engine only. The policy file on disk is
//! not rewritten, so a reload discards them.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{PolicyEngine, PolicyRule, RoleAssignment};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::{Created, MessageResponse};
use crate::state::AppState;

/// Current rules and role assignments.
#[derive(Debug, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Permission rules.
    pub rules: Vec<PolicyRule>,
    /// Role assignments.
    pub roles: Vec<RoleAssignment>,
}

fn engine(state: &AppState) -> ApiResult<Arc<PolicyEngine>> {
    state
        .policy()
        .cloned()
        .ok_or_else(|| ApiError::service_unavailable("policy engine is disabled"))
}

fn require_fields(fields: &[&str]) -> ApiResult<()> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::EmptyInput);
    }
    Ok(())
}

/// GET /api/policies
pub async fn list_policies(State(state): State<AppState>) -> ApiResult<Json<PolicySnapshot>> {
    let engine = engine(&state)?;
    Ok(Json(PolicySnapshot {
        rules: engine.rules().await,
        roles: engine.role_assignments().await,
    }))
}

/// POST /api/policies
pub async fn add_policy(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(rule): ValidatedJson<PolicyRule>,
) -> ApiResult<impl IntoResponse> {
    require_fields(&[&rule.subject, &rule.object, &rule.action])?;
    if !engine(&state)?.add_rule(rule.clone()).await? {
        return Err(ApiError::conflict("policy rule already exists"));
    }
    tracing::info!(by = %ctx.subject, "Policy rule added via API");
    Ok(Created(rule))
}

/// DELETE /api/policies
pub async fn remove_policy(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(rule): ValidatedJson<PolicyRule>,
) -> ApiResult<StatusCode> {
    if !engine(&state)?.remove_rule(&rule).await? {
        return Err(ApiError::not_found("policy rule"));
    }
    tracing::info!(by = %ctx.subject, "Policy rule removed via API");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/policies/roles
pub async fn assign_role(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(assignment): ValidatedJson<RoleAssignment>,
) -> ApiResult<impl IntoResponse> {
    require_fields(&[&assignment.user, &assignment.role])?;
    if !engine(&state)?
        .assign_role(&assignment.user, &assignment.role)
        .await?
    {
        return Err(ApiError::conflict("role already assigned"));
    }
    tracing::info!(by = %ctx.subject, "Role assigned via API");
    Ok(Created(assignment))
}

/// DELETE /api/policies/roles
pub async fn unassign_role(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(assignment): ValidatedJson<RoleAssignment>,
) -> ApiResult<StatusCode> {
    if !engine(&state)?
        .unassign_role(&assignment.user, &assignment.role)
        .await?
    {
        return Err(ApiError::not_found("role assignment"));
    }
    tracing::info!(by = %ctx.subject, "Role unassigned via API");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/policies/reload
///
/// Re-reads the model and policy files. A bad file leaves the current rules
/// in place and is reported as 422.
pub async fn reload_policies(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<Json<MessageResponse>> {
    let engine = engine(&state)?;
    engine.reload().await.map_err(|e| {
        tracing::warn!(by = %ctx.subject, error = %e, "Policy reload failed");
        ApiError::from(e)
    })?;
    Ok(Json(MessageResponse::new(format!(
        "policy reloaded: {} rules",
        engine.rules().await.len()
    ))))
}
