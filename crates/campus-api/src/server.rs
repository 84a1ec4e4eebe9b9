// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.
//!
//! Public routes (login, refresh, registration, health) pass only the global
//! layers. Protected routes additionally pass the [`PolicyLayer`] when a
//! policy engine is configured, then their own [`RoleLayer`](crate::middleware::RoleLayer).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post, put, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::allow_roles;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, PolicyLayer, RoleLayer};
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = create_cors_layer(&self.config);
        let auth = AuthLayer::new(self.state.codec().clone(), self.state.clock().clone())
            .with_public_paths(self.config.public_paths.iter().cloned());

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(cors)
            .layer(auth);

        let mut protected = protected_routes();
        if let Some(engine) = self.state.policy() {
            protected = protected.route_layer(PolicyLayer::new(engine.clone()));
        }

        public_routes()
            .merge(protected)
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!(
            addr = %addr,
            policy = self.state.policy().is_some(),
            "Starting API server"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }

    /// Returns the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

// =============================================================================
// Routes
// =============================================================================

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/register", post(handlers::register))
}

/// Attaches a role allow-list to a method router.
fn guarded(route: MethodRouter<AppState>, roles: RoleLayer) -> MethodRouter<AppState> {
    route.route_layer(roles)
}

fn protected_routes() -> Router<AppState> {
    use handlers::*;

    Router::new()
        .route("/api/me", guarded(get(me), allow_roles!()))
        // Users
        .route(
            "/api/users",
            guarded(get(list_users), allow_roles!(Admin, Manager))
                .merge(guarded(post(create_user), allow_roles!(Admin))),
        )
        .route(
            "/api/users/{id}",
            guarded(get(get_user), allow_roles!(Admin, Manager)).merge(guarded(
                put(update_user).delete(delete_user),
                allow_roles!(Admin),
            )),
        )
        // Courses
        .route(
            "/courses",
            guarded(get(list_courses), allow_roles!())
                .merge(guarded(post(create_course), allow_roles!(Admin, Manager))),
        )
        .route(
            "/courses/{id}",
            guarded(get(get_course), allow_roles!()).merge(guarded(
                put(update_course).delete(delete_course),
                allow_roles!(Admin, Manager),
            )),
        )
        .route(
            "/courses/{id}/students",
            guarded(get(course_students), allow_roles!(Admin, Manager, Teacher)),
        )
        .route(
            "/courses/{id}/teachers",
            guarded(get(course_teachers), allow_roles!(Admin, Manager, Teacher)),
        )
        // Students
        .route(
            "/students",
            guarded(get(list_students), allow_roles!(Admin, Manager, Teacher)),
        )
        .route(
            "/students/{id}",
            guarded(get(get_student), allow_roles!(Admin, Manager, Teacher)),
        )
        .route(
            "/students/{id}/courses",
            guarded(get(student_courses), allow_roles!()),
        )
        .route(
            "/students/{id}/courses/{course_id}",
            guarded(post(enroll_student), allow_roles!(Admin, Manager)),
        )
        // Teachers
        .route(
            "/teachers",
            guarded(get(list_teachers), allow_roles!(Admin, Manager)),
        )
        .route(
            "/teachers/{id}",
            guarded(get(get_teacher), allow_roles!(Admin, Manager)),
        )
        .route(
            "/teachers/{id}/courses",
            guarded(get(teacher_courses), allow_roles!(Admin, Manager, Teacher)),
        )
        .route(
            "/teachers/{id}/courses/{course_id}/students/{student_id}/marks",
            guarded(post(upsert_mark), allow_roles!(Teacher)),
        )
        // Managers
        .route("/managers", guarded(get(list_managers), allow_roles!(Admin)))
        .route(
            "/managers/teachers/{teacher_id}/courses/{course_id}",
            guarded(post(assign_teacher), allow_roles!(Admin, Manager)),
        )
        // Marks
        .route(
            "/marks/student/{student_id}",
            guarded(
                get(student_marks),
                allow_roles!(Admin, Manager, Teacher, Student),
            ),
        )
        .route(
            "/marks/course/{course_id}",
            guarded(get(course_marks), allow_roles!(Admin, Manager, Teacher)),
        )
        // Policies
        .route(
            "/api/policies",
            guarded(
                get(list_policies).post(add_policy).delete(remove_policy),
                allow_roles!(Admin),
            ),
        )
        .route(
            "/api/policies/roles",
            guarded(post(assign_role).delete(unassign_role), allow_roles!(Admin)),
        )
        .route(
            "/api/policies/reload",
            guarded(post(reload_policies), allow_roles!(Admin)),
        )
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let mut layer = CorsLayer::new()
        .max_age(Duration::from_secs(cors.max_age))
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if cors.allows_any_origin() {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(AllowOrigin::list(origins));
    }

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    // Credentials cannot be combined with a wildcard origin.
    if cors.allow_credentials && !cors.allows_any_origin() {
        layer = layer.allow_credentials(true);
    }

    layer
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use campus_core::{ManualClock, MemoryStore, NewUser, Role, UserRepository};
    use tower::ServiceExt;

    use crate::auth::{PasswordHasher, TokenConfig, TokenKind};

    async fn test_server() -> ApiServer {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let hasher = PasswordHasher::for_testing();
        store
            .create_user(NewUser::new("bob", hasher.hash("hunter2").unwrap(), Role::Student))
            .await
            .unwrap();

        let state = AppState::builder()
            .token_config(TokenConfig::for_testing())
            .hasher(hasher)
            .store(store)
            .clock(clock)
            .build()
            .unwrap();
        ApiServer::new(state)
    }

    fn bearer(server: &ApiServer, role: Role) -> String {
        let token = server
            .state()
            .codec()
            .issue(TokenKind::Access, "bob", role, server.state().clock().now())
            .unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let server = test_server().await;
        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let server = test_server().await;
        let response = server
            .router()
            .oneshot(Request::get("/courses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_route_allow_list_per_method() {
        let server = test_server().await;

        let response = server
            .router()
            .oneshot(
                Request::get("/courses")
                    .header(header::AUTHORIZATION, bearer(&server, Role::Student))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = server
            .router()
            .oneshot(
                Request::post("/courses")
                    .header(header::AUTHORIZATION, bearer(&server, Role::Student))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"name":"Algebra","code":"MATH101","faculty":"Science","credits":5}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_me_returns_profile_without_hash() {
        let server = test_server().await;
        let response = server
            .router()
            .oneshot(
                Request::get("/api/me")
                    .header(header::AUTHORIZATION, bearer(&server, Role::Student))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["username"], "bob");
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_policy_endpoints_disabled_without_engine() {
        let server = test_server().await;
        let response = server
            .router()
            .oneshot(
                Request::get("/api/policies")
                    .header(header::AUTHORIZATION, bearer(&server, Role::Admin))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_cors_layer() {
        let _ = create_cors_layer(&ApiConfig::default());
        let strict = ApiConfig::default().with_cors(crate::config::CorsConfig::strict(vec![
            "https://campus.example".to_string(),
        ]));
        let _ = create_cors_layer(&strict);
    }
}
