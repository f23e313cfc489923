// HTTP API error classification
use axum::{http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::OnceCell;
use serde_json::{json, Value};

use crate::config::Environment;

/// Environment mode consulted when rendering error envelopes. Set once during
/// app construction; defaults to development when unset (tests, tools).
static ENVIRONMENT: OnceCell<Environment> = OnceCell::new();

pub fn init_environment(env: Environment) {
    let _ = ENVIRONMENT.set(env);
}

fn is_production() -> bool {
    ENVIRONMENT
        .get()
        .map(|e| e.is_production())
        .unwrap_or(false)
}

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every failure in the pipeline funnels into one of these variants; the
/// response envelope is uniform so clients branch on status + `code` only.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    InvalidId(String),
    DuplicateField(String),
    ValidationError(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthenticated(String),
    InvalidToken(String),
    SessionExpired,
    InvalidCredentials,

    // 403 Forbidden
    CsrfValidationFailed,
    CorsOriginRejected(String),

    // 404 Not Found
    NotFound(String),

    // 413 / 415
    PayloadTooLarge { limit_bytes: usize },
    UnsupportedMediaType(String),

    // 429 Too Many Requests
    RateLimitExceeded { retry_after_secs: u64 },

    // 500 Internal Server Error; detail is logged, never sent in production
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidId(_)
            | ApiError::DuplicateField(_)
            | ApiError::ValidationError(_)
            | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_)
            | ApiError::InvalidToken(_)
            | ApiError::SessionExpired
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::CsrfValidationFailed | ApiError::CorsOriginRejected(_) => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidId(_) => "INVALID_ID",
            ApiError::DuplicateField(_) => "DUPLICATE_FIELD",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthenticated(_) => "AUTH_REQUIRED",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::SessionExpired => "SESSION_EXPIRED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::CsrfValidationFailed => "CSRF_VALIDATION_FAILED",
            ApiError::CorsOriginRejected(_) => "CORS_ORIGIN_REJECTED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationError(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::InvalidToken(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::InvalidId(id) => format!("Invalid chart id: {}", id),
            ApiError::DuplicateField(field) => format!("Duplicate value for field '{}'", field),
            ApiError::SessionExpired => {
                "Session expired, please authenticate again".to_string()
            }
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::CsrfValidationFailed => "CSRF token validation failed".to_string(),
            ApiError::CorsOriginRejected(origin) => {
                format!("Origin '{}' is not allowed", origin)
            }
            ApiError::PayloadTooLarge { limit_bytes } => {
                format!("Request body exceeds {} bytes", limit_bytes)
            }
            ApiError::UnsupportedMediaType(ct) => {
                format!("Unsupported content type '{}'", ct)
            }
            ApiError::RateLimitExceeded { .. } => {
                "Too many requests, please try again later".to_string()
            }
            ApiError::Internal(detail) => {
                if is_production() {
                    "An unexpected error occurred".to_string()
                } else {
                    detail.clone()
                }
            }
        }
    }

    /// Uniform error envelope. The `stack` field carries internal detail and
    /// is only emitted outside production.
    pub fn to_json(&self) -> Value {
        let mut envelope = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let ApiError::Internal(detail) = self {
            if !is_production() {
                envelope["stack"] = json!(detail);
            }
        }

        envelope
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!("internal error: {}", detail);
        ApiError::Internal(detail)
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        match err {
            crate::store::StoreError::NotFound(id) => {
                ApiError::not_found(format!("Chart not found: {}", id))
            }
            crate::store::StoreError::Duplicate(field) => ApiError::DuplicateField(field),
        }
    }
}

impl From<crate::auth::SessionTokenError> for ApiError {
    fn from(err: crate::auth::SessionTokenError) -> Self {
        match err {
            crate::auth::SessionTokenError::Expired => ApiError::SessionExpired,
            crate::auth::SessionTokenError::MalformedIssuerAudience => {
                ApiError::InvalidToken("Session token issuer/audience mismatch".to_string())
            }
            crate::auth::SessionTokenError::InvalidSignature(msg) => {
                ApiError::InvalidToken(format!("Invalid session token: {}", msg))
            }
            crate::auth::SessionTokenError::Mint(msg) => ApiError::internal(msg),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();

        if let ApiError::RateLimitExceeded { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            ApiError::InvalidId("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DuplicateField("title".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::SessionExpired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::CsrfValidationFailed.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::PayloadTooLarge { limit_bytes: 1 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::RateLimitExceeded { retry_after_secs: 1 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn envelope_carries_code_and_timestamp() {
        let body = ApiError::CsrfValidationFailed.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "CSRF_VALIDATION_FAILED");
        assert!(body["timestamp"].is_string());
    }
}
