use axum::{extract::Request, middleware::Next, response::Response};

use crate::middleware::rate_limit::client_key;

/// Tail-stage failure logging. Successful requests are covered by the
/// TraceLayer; this records the request metadata (method, path, client,
/// user agent) for every error response, including ones produced by
/// earlier pipeline stages.
pub async fn request_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_key(&request);
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(%method, %path, %client, %user_agent, %status, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, %client, %user_agent, %status, "request rejected");
    }

    response
}
