pub mod auth;
pub mod body_guard;
pub mod cors;
pub mod csrf;
pub mod rate_limit;
pub mod request_log;
pub mod response;
pub mod security_headers;

pub use auth::{optional_auth_middleware, require_auth_middleware, AuthUser};
pub use body_guard::body_guard_middleware;
pub use cors::cors_middleware;
pub use csrf::csrf_middleware;
pub use rate_limit::{general_rate_limit_middleware, strict_rate_limit_middleware, RateLimiter};
pub use request_log::request_log_middleware;
pub use response::{ApiResponse, ApiResult, Pagination};
pub use security_headers::security_headers_middleware;
