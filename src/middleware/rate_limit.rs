use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// Fixed-window request counter keyed by client address. Counters reset at
/// the window boundary; no sliding decay.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

pub enum RateDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            // A poisoned counter table only ever means a panicked request
            // task; the counts themselves are still usable.
            Err(poisoned) => poisoned.into_inner(),
        };

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.window_start);
            let retry_after_secs = self.window.saturating_sub(elapsed).as_secs().max(1);
            return RateDecision::Limited { retry_after_secs };
        }

        entry.count += 1;
        RateDecision::Allowed
    }
}

/// Client key for rate limiting: proxy header first, then the socket peer.
pub fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// General ceiling applied to all traffic.
pub async fn general_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    match state.general_limiter.check(&key) {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Limited { retry_after_secs } => {
            tracing::warn!(client = %key, "general rate limit exceeded");
            ApiError::RateLimitExceeded { retry_after_secs }.into_response()
        }
    }
}

/// Stricter ceiling on mutating chart-route traffic. Safe methods and
/// non-chart paths bypass. Sits ahead of the CSRF guard so rejected
/// mutations still count against the ceiling.
pub async fn strict_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_safe_method(request.method()) || !request.uri().path().starts_with("/api/charts") {
        return next.run(request).await;
    }

    let key = client_key(&request);

    match state.strict_limiter.check(&key) {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Limited { retry_after_secs } => {
            tracing::warn!(client = %key, "strict rate limit exceeded");
            ApiError::RateLimitExceeded { retry_after_secs }.into_response()
        }
    }
}

pub fn is_safe_method(method: &axum::http::Method) -> bool {
    use axum::http::Method;
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}
