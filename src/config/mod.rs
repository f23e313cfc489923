use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub body: BodyLimitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Session token lifetime, also the session cookie max-age.
    pub session_ttl_hours: i64,
    /// CSRF cookie max-age.
    pub csrf_ttl_hours: i64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    /// Ceiling for all traffic within one window.
    pub general_max: u32,
    /// Ceiling for mutating chart-route traffic within one window.
    pub strict_max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyLimitConfig {
    pub max_json_bytes: usize,
    pub max_form_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        // Environment presets first, specific env vars override.
        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = v.parse().unwrap_or(self.rate_limit.window_secs);
        }
        if let Ok(v) = env::var("RATE_LIMIT_GENERAL_MAX") {
            self.rate_limit.general_max = v.parse().unwrap_or(self.rate_limit.general_max);
        }
        if let Ok(v) = env::var("RATE_LIMIT_STRICT_MAX") {
            self.rate_limit.strict_max = v.parse().unwrap_or(self.rate_limit.strict_max);
        }
        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3001,
                shutdown_grace_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: "dev-only-secret-change-me".to_string(),
                jwt_issuer: "chart-storage-api".to_string(),
                jwt_audience: "chart-storage-client".to_string(),
                session_ttl_hours: 24 * 7,
                csrf_ttl_hours: 24,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            rate_limit: RateLimitConfig {
                window_secs: 15 * 60,
                general_max: 100,
                strict_max: 20,
            },
            body: BodyLimitConfig {
                max_json_bytes: 2 * 1024 * 1024,
                max_form_bytes: 1024 * 1024,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3001,
                shutdown_grace_secs: 10,
            },
            security: SecurityConfig {
                // Must be overridden via JWT_SECRET in real deployments.
                jwt_secret: String::new(),
                jwt_issuer: "chart-storage-api".to_string(),
                jwt_audience: "chart-storage-client".to_string(),
                session_ttl_hours: 24 * 7,
                csrf_ttl_hours: 24,
                cors_origins: vec!["https://charts.example.com".to_string()],
            },
            rate_limit: RateLimitConfig {
                window_secs: 15 * 60,
                general_max: 100,
                strict_max: 20,
            },
            body: BodyLimitConfig {
                max_json_bytes: 2 * 1024 * 1024,
                max_form_bytes: 1024 * 1024,
            },
        }
    }
}
