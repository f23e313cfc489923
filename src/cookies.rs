//! Cookie construction for the two auth-adjacent cookies.
//!
//! The CSRF cookie is deliberately script-readable so the client can echo it
//! back in the `X-CSRF-Token` header; the session cookie is HTTP-only and
//! never reaches script. Both are `SameSite=Lax` with `Secure` tied to
//! production mode.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Duration;

use crate::config::AppConfig;

pub const CSRF_COOKIE: &str = "XSRF-TOKEN";
pub const SESSION_COOKIE: &str = "authToken";

pub fn csrf_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(CSRF_COOKIE, token);
    cookie.set_http_only(false);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.environment.is_production());
    cookie.set_path("/");
    cookie.set_max_age(max_age(Duration::hours(config.security.csrf_ttl_hours)));
    cookie
}

pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.environment.is_production());
    cookie.set_path("/");
    cookie.set_max_age(max_age(Duration::hours(config.security.session_ttl_hours)));
    cookie
}

/// Removal cookie for the session. Attribute parity with `session_cookie` is
/// required for browsers to actually delete it. There is no CSRF equivalent:
/// CSRF tokens lapse by max-age or are superseded by a later mint.
pub fn clear_session_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.environment.is_production());
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

fn max_age(duration: Duration) -> time::Duration {
    time::Duration::seconds(duration.num_seconds())
}
