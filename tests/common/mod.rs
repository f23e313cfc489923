#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use chart_storage_api::{app, AppConfig, AppState};

/// App with relaxed rate limits so unrelated suites never trip a ceiling.
/// Rate-limit tests build their own config.
pub fn test_app() -> Router {
    let mut config = AppConfig::development();
    config.rate_limit.general_max = 10_000;
    config.rate_limit.strict_max = 10_000;
    app_with(config)
}

pub fn app_with(config: AppConfig) -> Router {
    app(AppState::new(config))
}

/// Drive one request through the full pipeline and decode the JSON body.
pub async fn send(
    router: &Router,
    request: Request<Body>,
) -> Result<(StatusCode, HeaderMap, Value)> {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .context("router oneshot")?;

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).context("response body is not JSON")?
    };

    Ok((status, headers, body))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Extract a cookie value from the response's Set-Cookie headers.
pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", name)))
        .and_then(|v| v.split(';').next())
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
}

/// Full Set-Cookie header line for a given cookie, attribute string included.
pub fn set_cookie_line(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", name)))
        .map(|v| v.to_string())
}

/// Obtain a CSRF token via the issuance endpoint. Returns the token; send it
/// as both the `XSRF-TOKEN` cookie and the `X-CSRF-Token` header.
pub async fn csrf_handshake(router: &Router) -> Result<String> {
    let (status, headers, body) = send(router, get("/api/csrf-token")).await?;
    anyhow::ensure!(status == StatusCode::OK, "csrf handshake failed: {}", status);

    let cookie_token =
        set_cookie_value(&headers, "XSRF-TOKEN").context("no XSRF-TOKEN cookie set")?;
    let body_token = body["data"]["token"]
        .as_str()
        .context("no token in body")?
        .to_string();
    anyhow::ensure!(cookie_token == body_token, "cookie/body token mismatch");

    Ok(body_token)
}

/// Mutating JSON request carrying the double-submit token and optionally a
/// session cookie.
pub fn mutating_request(
    method: &str,
    uri: &str,
    body: &Value,
    csrf_token: &str,
    session: Option<&str>,
) -> Request<Body> {
    let cookie = match session {
        Some(session) => format!("XSRF-TOKEN={}; authToken={}", csrf_token, session),
        None => format!("XSRF-TOKEN={}", csrf_token),
    };

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .header("x-csrf-token", csrf_token)
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Log in as the demo user and return (csrf_token, session_token).
pub async fn login_demo(router: &Router) -> Result<(String, String)> {
    let csrf = csrf_handshake(router).await?;
    let body = serde_json::json!({
        "email": "demo@example.com",
        "password": "demo123",
    });

    let (status, headers, _) = send(
        router,
        mutating_request("POST", "/api/auth/login", &body, &csrf, None),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {}", status);

    let session = set_cookie_value(&headers, "authToken").context("no authToken cookie")?;
    Ok((csrf, session))
}
