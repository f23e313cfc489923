use axum::{extract::State, response::IntoResponse, Extension};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{mint_session_token, Claims, Identity};
use crate::cookies::{clear_session_cookie, session_cookie};
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::{ApiResponse, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public claim fields returned to clients. The token itself only travels in
/// the HTTP-only cookie.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<&AuthUser> for PublicUser {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
        }
    }
}

impl From<&Identity> for PublicUser {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role.clone(),
        }
    }
}

/// POST /api/auth/login - Verify credentials and establish a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.as_deref().unwrap_or("").trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("A valid email address is required"));
    }
    let password = payload.password.as_deref().unwrap_or("");
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let identity = state
        .credentials
        .verify(email, password)
        .ok_or(ApiError::InvalidCredentials)?;

    let claims = Claims::new(&identity, &state.config.security);
    let token = mint_session_token(&claims, &state.config.security)?;
    let jar = jar.add(session_cookie(token, &state.config));

    tracing::info!(email = %identity.email, role = %identity.role, "login succeeded");

    Ok((
        jar,
        ApiResponse::success(json!({ "user": PublicUser::from(&identity) })),
    ))
}

/// POST /api/auth/logout - Clear the session cookie
///
/// Optional-auth semantics: an invalid or absent session still gets its
/// cookie cleared, and the response is always 200.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let jar = jar.add(clear_session_cookie(&state.config));
    Ok((
        jar,
        ApiResponse::success(json!({ "message": "Logged out" })),
    ))
}

/// GET /api/auth/me - Current identity claims (requires session)
pub async fn me(Extension(user): Extension<AuthUser>) -> Result<impl IntoResponse, ApiError> {
    Ok(ApiResponse::success(json!({
        "user": PublicUser::from(&user)
    })))
}

/// GET /api/auth/status - Session probe (optional session)
pub async fn status(
    user: Option<Extension<AuthUser>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = match user {
        Some(Extension(user)) => json!({
            "authenticated": true,
            "user": PublicUser::from(&user),
        }),
        None => json!({
            "authenticated": false,
            "user": null,
        }),
    };

    Ok(ApiResponse::success(body))
}

/// POST /api/auth/refresh - Reissue the session cookie (requires session)
///
/// Identity claims are preserved; only issued-at and expiry move.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role.clone(),
    };

    let claims = Claims::new(&identity, &state.config.security);
    let token = mint_session_token(&claims, &state.config.security)?;
    let jar = jar.add(session_cookie(token, &state.config));

    Ok((
        jar,
        ApiResponse::success(json!({ "user": PublicUser::from(&identity) })),
    ))
}
