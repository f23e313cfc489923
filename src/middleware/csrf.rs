use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::mint_csrf_token;
use crate::cookies::{csrf_cookie, CSRF_COOKIE};
use crate::error::ApiError;
use crate::middleware::rate_limit::is_safe_method;
use crate::state::AppState;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Double-submit cookie guard.
///
/// Safe methods bypass validation; if the client has no CSRF cookie yet, one
/// is minted on the way out so the first read silently provisions the token
/// for later mutating calls. Mutating methods must echo the cookie value in
/// the `X-CSRF-Token` header. Validity is cookie/header equality alone; no
/// token is stored server-side.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let cookie_token = jar.get(CSRF_COOKIE).map(|c| c.value().to_string());

    if is_safe_method(request.method()) {
        let mut response = next.run(request).await;

        // Idempotent issuance: an existing cookie is never overwritten, and a
        // handler that already set one (the token endpoint) wins.
        let already_issued = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&format!("{}=", CSRF_COOKIE)));
        if cookie_token.is_none() && !already_issued {
            let cookie = csrf_cookie(mint_csrf_token(), &state.config);
            if let Ok(value) = cookie.to_string().parse() {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }

        return response;
    }

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    match (cookie_token, header_token) {
        (Some(cookie), Some(header)) if !cookie.is_empty() && cookie == header => {
            next.run(request).await
        }
        _ => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "CSRF double-submit validation failed"
            );
            ApiError::CsrfValidationFailed.into_response()
        }
    }
}
