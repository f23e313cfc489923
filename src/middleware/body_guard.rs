use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::middleware::rate_limit::is_safe_method;
use crate::sanitize::sanitize_value;
use crate::state::AppState;

/// Body parsing stage: enforces size ceilings and content types, then parses
/// and sanitizes JSON bodies before any handler runs. The handler receives
/// the re-serialized, cleaned body.
pub async fn body_guard_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_safe_method(request.method()) {
        return next.run(request).await;
    }

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let limit = match content_type.as_deref() {
        Some(ct) if ct.starts_with("application/json") => state.config.body.max_json_bytes,
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
            state.config.body.max_form_bytes
        }
        // No declared type: only an empty body is acceptable.
        _ => 0,
    };

    // Reject on the declared length before buffering anything.
    if let Some(declared) = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    {
        if declared > limit && limit > 0 {
            return ApiError::PayloadTooLarge { limit_bytes: limit }.into_response();
        }
    }

    let (mut parts, body) = request.into_parts();

    let bytes = match to_bytes(body, limit.max(1)).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return match limit {
                0 => ApiError::UnsupportedMediaType(
                    content_type.unwrap_or_else(|| "<none>".to_string()),
                )
                .into_response(),
                limit_bytes => ApiError::PayloadTooLarge { limit_bytes }.into_response(),
            }
        }
    };

    if bytes.is_empty() {
        return next.run(Request::from_parts(parts, Body::empty())).await;
    }

    if limit == 0 {
        return ApiError::UnsupportedMediaType(
            content_type.unwrap_or_else(|| "<none>".to_string()),
        )
        .into_response();
    }

    let is_json = content_type
        .as_deref()
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    let body = if is_json {
        let parsed: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                return ApiError::InvalidJson(format!("Malformed JSON body: {}", e))
                    .into_response()
            }
        };

        let clean = sanitize_value(parsed);
        let clean_bytes = match serde_json::to_vec(&clean) {
            Ok(bytes) => bytes,
            Err(e) => return ApiError::internal(e.to_string()).into_response(),
        };

        if let Ok(len) = HeaderValue::from_str(&clean_bytes.len().to_string()) {
            parts.headers.insert(header::CONTENT_LENGTH, len);
        }
        Body::from(clean_bytes)
    } else {
        Body::from(bytes)
    };

    next.run(Request::from_parts(parts, body)).await
}
