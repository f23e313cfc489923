use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::{verify_session_token, Claims, SessionTokenError};
use crate::cookies::{clear_session_cookie, SESSION_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context extracted from the session cookie.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub issued_at: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
            issued_at: claims.iat,
        }
    }
}

fn session_token(request: &Request) -> Option<String> {
    let jar = CookieJar::from_headers(request.headers());
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Session guard for protected routes. Expired tokens clear the session
/// cookie on the 401 so the client knows to re-authenticate rather than
/// retry.
pub async fn require_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match session_token(&request) {
        Some(token) => token,
        None => {
            return ApiError::Unauthenticated("Authentication required".to_string())
                .into_response()
        }
    };

    match verify_session_token(&token, &state.config.security) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser::from(claims));
            next.run(request).await
        }
        Err(SessionTokenError::Expired) => {
            let mut response = ApiError::SessionExpired.into_response();
            let cookie = clear_session_cookie(&state.config);
            if let Ok(value) = cookie.to_string().parse() {
                response.headers_mut().append(SET_COOKIE, value);
            }
            response
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Session guard for routes that work with or without identity. Any decode
/// failure is swallowed; the request proceeds anonymously.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(&request) {
        if let Ok(claims) = verify_session_token(&token, &state.config.security) {
            request.extensions_mut().insert(AuthUser::from(claims));
        }
    }

    next.run(request).await
}
