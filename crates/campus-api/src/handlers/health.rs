// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::{ComponentStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Simple liveness check. Returns 200 OK if the service is running.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

// =============================================================================
// Readiness Check
// =============================================================================

/// GET /ready
///
/// Readiness check over the store and the policy engine.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = Vec::new();
    let mut all_healthy = true;

    match state.store().list_users().await {
        Ok(users) => components.push(ComponentStatus::healthy(
            "store",
            Some(format!("{} users", users.len())),
        )),
        Err(e) => {
            all_healthy = false;
            components.push(ComponentStatus {
                name: "store".to_string(),
                healthy: false,
                message: Some(e.to_string()),
            });
        }
    }

    let policy_message = match state.policy() {
        Some(engine) => format!("{} rules", engine.rules().await.len()),
        None => "Not configured".to_string(),
    };
    components.push(ComponentStatus::healthy("policy", Some(policy_message)));

    let response = ReadinessResponse {
        ready: all_healthy,
        components,
    };

    if all_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

// =============================================================================
// Tests
// =============================================================================
