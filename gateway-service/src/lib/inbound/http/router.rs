use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::HeaderName;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::authenticate::authenticate;
use super::handlers::create_user::create_user;
use super::handlers::get_user::get_current_user;
use super::handlers::get_user::get_user;
use super::handlers::list_services::list_services;
use super::handlers::proxy::proxy;
use super::handlers::register_service::register_service;
use super::handlers::reset_password::reset_password;
use super::handlers::update_service::update_service;
use super::handlers::update_user::update_user;
use super::middleware::require_permission;
use super::middleware::PermissionGuard;
use crate::authorization::ports::AuthorizerPort;
use crate::catalog::ports::ServiceCatalogPort;
use crate::identity::ports::IdentityServicePort;
use crate::outbound::upstream::UpstreamClient;
use crate::proxy::ProxyGateway;

pub const READ_USER: &str = "read-user";
pub const UPDATE_USER: &str = "update-user";
pub const RESET_PASSWORD: &str = "reset-password";
pub const READ_ALL_SERVICE: &str = "read-all-service";
pub const CREATE_SERVICE: &str = "create-service";
pub const UPDATE_SERVICE: &str = "update-service";

/// Shared state for API handlers and the proxy fallback.
#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<dyn IdentityServicePort>,
    pub catalog: Arc<dyn ServiceCatalogPort>,
    pub authorizer: Arc<dyn AuthorizerPort>,
    pub gateway: ProxyGateway,
    pub upstream: UpstreamClient,
    /// Request header naming the proxy target.
    pub service_header: HeaderName,
}

impl AppState {
    fn guard(&self, permission: Option<&'static str>) -> PermissionGuard {
        PermissionGuard::new(Arc::clone(&self.authorizer), permission)
    }
}

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/login", post(authenticate))
        .route("/api/users", post(create_user));

    let protected_routes = Router::new()
        .route(
            "/api/users/me",
            get(get_current_user).route_layer(middleware::from_fn_with_state(
                state.guard(None),
                require_permission,
            )),
        )
        .route(
            "/api/users/:user_id",
            get(get_user).route_layer(middleware::from_fn_with_state(
                state.guard(Some(READ_USER)),
                require_permission,
            )),
        )
        .route(
            "/api/users/:user_id",
            put(update_user).route_layer(middleware::from_fn_with_state(
                state.guard(Some(UPDATE_USER)),
                require_permission,
            )),
        )
        .route(
            "/api/users/:user_id/reset-password",
            post(reset_password).route_layer(middleware::from_fn_with_state(
                state.guard(Some(RESET_PASSWORD)),
                require_permission,
            )),
        )
        .route(
            "/api/services",
            get(list_services).route_layer(middleware::from_fn_with_state(
                state.guard(Some(READ_ALL_SERVICE)),
                require_permission,
            )),
        )
        .route(
            "/api/services",
            post(register_service).route_layer(middleware::from_fn_with_state(
                state.guard(Some(CREATE_SERVICE)),
                require_permission,
            )),
        )
        .route(
            "/api/services/:identifier",
            put(update_service).route_layer(middleware::from_fn_with_state(
                state.guard(Some(UPDATE_SERVICE)),
                require_permission,
            )),
        );

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(proxy)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
