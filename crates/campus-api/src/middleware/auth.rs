// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token authentication middleware.
//!
//! Extracts the access token from `Authorization: Bearer <token>`, verifies it
//! against the injected clock and stores the resulting [`AuthContext`] in the
//! request extensions. Any failure ends the request with 401.

use std::collections::HashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use campus_core::Clock;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::auth::{AuthContext, TokenCodec, TokenKind};
use crate::error::ApiError;

/// Paths reachable without a token.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/health", "/ready", "/login", "/refresh", "/register"];

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for access token authentication.
#[derive(Clone)]
pub struct AuthLayer {
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    public_paths: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a new auth layer with no public paths.
    pub fn new(codec: TokenCodec, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec,
            clock,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Sets paths that don't require authentication.
    ///
    /// A trailing `*` makes the entry a prefix.
    pub fn with_public_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.public_paths = Arc::new(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Uses [`DEFAULT_PUBLIC_PATHS`].
    pub fn with_default_public_paths(self) -> Self {
        self.with_public_paths(DEFAULT_PUBLIC_PATHS.iter().copied())
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            codec: self.codec.clone(),
            clock: self.clock.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for access token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    public_paths: Arc<HashSet<String>>,
}

impl<S> AuthMiddleware<S> {
    fn is_public_path(&self, path: &str) -> bool {
        if self.public_paths.contains(path) {
            return true;
        }
        self.public_paths.iter().any(|public| {
            public
                .strip_suffix('*')
                .is_some_and(|prefix| path.starts_with(prefix))
        })
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let codec = self.codec.clone();
        let now = self.clock.now();
        let is_public = self.is_public_path(req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_public {
                return inner.call(req).await;
            }

            let Some(token) = extract_bearer_token(&req) else {
                tracing::debug!(path = %req.uri().path(), "No bearer token provided");
                return Ok(ApiError::MissingToken.into_response());
            };

            let claims = match codec.verify(TokenKind::Access, &token, now) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::debug!(error = %e, path = %req.uri().path(), "Access token rejected");
                    return Ok(ApiError::from(e).into_response());
                }
            };

            let mut auth_ctx = AuthContext::from_claims(&claims).with_request_id(Uuid::now_v7());
            if let Some(ip) = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip())
            {
                auth_ctx = auth_ctx.with_client_ip(ip);
            }

            req.extensions_mut().insert(auth_ctx);
            inner.call(req).await
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
///
/// The scheme name is case-insensitive.
fn extract_bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let scheme = value.get(..7)?;
            scheme
                .eq_ignore_ascii_case("bearer ")
                .then(|| &value[7..])
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================
