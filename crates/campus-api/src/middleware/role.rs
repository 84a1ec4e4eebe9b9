// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-route role allow-list middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use campus_core::Role;
use tower::{Layer, Service};

use crate::auth::AuthContext;
use crate::error::ApiError;

// =============================================================================
// RoleLayer
// =============================================================================

/// Layer that admits only the listed roles.
///
/// Requires an [`AuthContext`] in the request extensions. An empty allow-list
/// admits any authenticated role.
#[derive(Debug, Clone)]
pub struct RoleLayer {
    allowed: Arc<Vec<Role>>,
}

impl RoleLayer {
    /// Admits only `roles`.
    pub fn allow(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: Arc::new(roles.into_iter().collect()),
        }
    }

    /// Admits any authenticated role.
    pub fn any() -> Self {
        Self {
            allowed: Arc::new(Vec::new()),
        }
    }

    /// Returns `true` if `role` passes this allow-list.
    pub fn permits(&self, role: Role) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&role)
    }
}

impl<S> Layer<S> for RoleLayer {
    type Service = RoleMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoleMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

// =============================================================================
// RoleMiddleware
// =============================================================================

/// Middleware enforcing a [`RoleLayer`] allow-list.
#[derive(Clone)]
pub struct RoleMiddleware<S> {
    inner: S,
    layer: RoleLayer,
}

impl<S> Service<Request<Body>> for RoleMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let layer = self.layer.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(ctx) = req.extensions().get::<AuthContext>().cloned() else {
                tracing::warn!("No auth context found, denying access");
                return Ok(ApiError::MissingToken.into_response());
            };

            if layer.permits(ctx.role) {
                return inner.call(req).await;
            }

            tracing::warn!(
                user = %ctx.subject,
                role = %ctx.role,
                path = %req.uri().path(),
                allowed = ?layer.allowed.as_slice(),
                "Role not permitted"
            );
            Ok(ApiError::forbidden(format!("role {} not permitted", ctx.role)).into_response())
        })
    }
}

/// Builds a [`RoleLayer`] from role variant names.
///
/// ```rust,ignore
/// let layer = allow_roles!(Admin, Manager);
/// ```
#[macro_export]
macro_rules! allow_roles {
    () => {
        $crate::middleware::RoleLayer::any()
    };
    ($($role:ident),+ $(,)?) => {
        $crate::middleware::RoleLayer::allow([$(::campus_core::Role::$role),+])
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::convert::Infallible;
    use tower::ServiceExt;

    async fn ok(_req: Request<Body>) -> Result<Response, Infallible> {
        Ok(Response::new(Body::empty()))
    }

    fn request_as(role: Option<Role>) -> Request<Body> {
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        if let Some(role) = role {
            req.extensions_mut().insert(AuthContext::new("user", role));
        }
        req
    }

    #[tokio::test]
    async fn test_listed_role_is_permitted() {
        let mut service = RoleLayer::allow([Role::Teacher]).layer(tower::service_fn(ok));
        let response = service
            .ready()
            .await
            .unwrap()
            .call(request_as(Some(Role::Teacher)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unlisted_role_is_forbidden() {
        let mut service = allow_roles!(Admin).layer(tower::service_fn(ok));
        let response = service
            .ready()
            .await
            .unwrap()
            .call(request_as(Some(Role::Teacher)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_empty_list_admits_any_role() {
        for role in Role::all() {
            let response = allow_roles!()
                .layer(tower::service_fn(ok))
                .oneshot(request_as(Some(*role)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_missing_context_is_unauthorized() {
        let response = RoleLayer::any()
            .layer(tower::service_fn(ok))
            .oneshot(request_as(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_permits() {
        let layer = allow_roles!(Admin, Manager);
        assert!(layer.permits(Role::Admin));
        assert!(layer.permits(Role::Manager));
        assert!(!layer.permits(Role::Student));
    }
}
