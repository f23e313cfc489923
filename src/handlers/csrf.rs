use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::auth::mint_csrf_token;
use crate::cookies::{csrf_cookie, CSRF_COOKIE};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET /api/csrf-token - Provision (or echo) the double-submit token
///
/// The cookie value is the source of truth: when the client already holds a
/// CSRF cookie, the same token is echoed back rather than superseded, so
/// repeated calls are idempotent. Only a cookie-less client gets a fresh
/// mint.
pub async fn csrf_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let (jar, token) = match jar.get(CSRF_COOKIE) {
        Some(existing) => {
            let token = existing.value().to_string();
            (jar, token)
        }
        None => {
            let token = mint_csrf_token();
            let jar = jar.add(csrf_cookie(token.clone(), &state.config));
            (jar, token)
        }
    };

    Ok((
        jar,
        ApiResponse::success(json!({
            "token": token,
            "expiresIn": "24h",
        })),
    ))
}
