use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{auth, charts, csrf};
use crate::middleware::{
    body_guard_middleware, cors_middleware, csrf_middleware, general_rate_limit_middleware,
    optional_auth_middleware, request_log_middleware, require_auth_middleware,
    security_headers_middleware, strict_rate_limit_middleware,
};
use crate::state::AppState;

/// Build the full request pipeline around the route handlers.
///
/// Layer order (outermost first): failure logging, security headers, request
/// tracing, general rate limit, strict rate limit (mutating chart traffic
/// only), CORS, body guard + sanitization, CSRF guard. Session guards are
/// per-route-group.
pub fn app(state: AppState) -> Router {
    crate::error::init_environment(state.config.environment);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/csrf-token", get(csrf::csrf_token))
        .merge(auth_routes(&state))
        .merge(chart_routes())
        .fallback(unknown_route)
        .layer(from_fn_with_state(state.clone(), csrf_middleware))
        .layer(from_fn_with_state(state.clone(), body_guard_middleware))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            strict_rate_limit_middleware,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            general_rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_log_middleware))
        .with_state(state)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/refresh", post(auth::refresh))
        .layer(from_fn_with_state(state.clone(), require_auth_middleware));

    let optional = Router::new()
        .route("/api/auth/status", get(auth::status))
        .layer(from_fn_with_state(state.clone(), optional_auth_middleware));

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .merge(protected)
        .merge(optional)
}

fn chart_routes() -> Router<AppState> {
    Router::new()
        .route("/api/charts", get(charts::list_charts).post(charts::create_chart))
        .route(
            "/api/charts/:id",
            get(charts::get_chart)
                .put(charts::update_chart)
                .delete(charts::delete_chart),
        )
        .route("/api/charts/:id/stats", get(charts::chart_stats))
        .route("/api/charts/:id/duplicate", post(charts::duplicate_chart))
}

async fn root() -> axum::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::Json(json!({
        "success": true,
        "data": {
            "name": "Chart Storage API (Rust)",
            "version": version,
            "description": "CRUD storage for Plotly figure payloads with cookie session auth",
            "endpoints": {
                "csrf": "GET /api/csrf-token",
                "auth": "POST /api/auth/login, POST /api/auth/logout, GET /api/auth/me, GET /api/auth/status, POST /api/auth/refresh",
                "charts": "GET|POST /api/charts, GET|PUT|DELETE /api/charts/:id, GET /api/charts/:id/stats, POST /api/charts/:id/duplicate",
            }
        }
    }))
}

async fn health() -> axum::Json<Value> {
    axum::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}

async fn unknown_route() -> ApiError {
    ApiError::not_found("Route not found")
}
