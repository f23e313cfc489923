use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Allow-list CORS check. Requests without an `Origin` header (curl, server
/// to server) pass untouched; a disallowed origin is rejected outright
/// rather than left to fail in the browser.
pub async fn cors_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = match request.headers().get(header::ORIGIN) {
        Some(value) => match value.to_str() {
            Ok(origin) => origin.to_string(),
            Err(_) => {
                return ApiError::CorsOriginRejected("<invalid>".to_string()).into_response()
            }
        },
        None => return next.run(request).await,
    };

    if !state
        .config
        .security
        .cors_origins
        .iter()
        .any(|allowed| allowed == &origin)
    {
        tracing::warn!(%origin, "rejected cross-origin request");
        return ApiError::CorsOriginRejected(origin).into_response();
    }

    let origin_value = match HeaderValue::from_str(&origin) {
        Ok(value) => value,
        Err(_) => return ApiError::CorsOriginRejected(origin).into_response(),
    };

    // Preflight is answered here; it never reaches CSRF or auth.
    let mut response = if *request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin_value);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, x-csrf-token"),
    );

    response
}
