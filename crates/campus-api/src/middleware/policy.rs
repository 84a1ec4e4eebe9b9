// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Policy enforcement middleware.
//!
//! Asks the [`PolicyEngine`] whether the authenticated role may perform the
//! request's method on its path. Applied on protected routes, after
//! authentication and before the per-route role check.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{AuthContext, PolicyEngine};
use crate::error::ApiError;

/// Layer for policy enforcement.
#[derive(Debug, Clone)]
pub struct PolicyLayer {
    engine: Arc<PolicyEngine>,
}

impl PolicyLayer {
    /// Creates a policy layer backed by `engine`.
    pub fn new(engine: Arc<PolicyEngine>) -> Self {
        Self { engine }
    }
}

impl<S> Layer<S> for PolicyLayer {
    type Service = PolicyMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PolicyMiddleware {
            inner,
            engine: self.engine.clone(),
        }
    }
}

/// Middleware for policy enforcement.
#[derive(Clone)]
pub struct PolicyMiddleware<S> {
    inner: S,
    engine: Arc<PolicyEngine>,
}

impl<S> Service<Request<Body>> for PolicyMiddleware<S>
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
        let engine = self.engine.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(ctx) = req.extensions().get::<AuthContext>().cloned() else {
                tracing::warn!("No auth context found, denying access");
                return Ok(ApiError::MissingToken.into_response());
            };

            let path = req.uri().path().to_string();
            let method = req.method().as_str().to_string();

            if engine.enforce(ctx.role.as_str(), &path, &method).await {
                return inner.call(req).await;
            }

            tracing::warn!(
                user = %ctx.subject,
                role = %ctx.role,
                path = %path,
                method = %method,
                "Denied by policy"
            );
            Ok(ApiError::forbidden("denied by policy").into_response())
        })
    }
}
