use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub mod credentials;

pub use credentials::{CredentialVerifier, DemoDirectory, Identity};

/// Session token claim set. Signature plus issuer/audience/expiry must all
/// validate before any of these fields are trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn new(identity: &Identity, security: &SecurityConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(security.session_ttl_hours);

        Self {
            sub: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: security.jwt_issuer.clone(),
            aud: security.jwt_audience.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionTokenError {
    #[error("session token expired")]
    Expired,

    #[error("session token issuer/audience mismatch")]
    MalformedIssuerAudience,

    #[error("invalid session token: {0}")]
    InvalidSignature(String),

    #[error("token generation failed: {0}")]
    Mint(String),
}

/// Mint an opaque CSRF token: 32 bytes of OS randomness as 64 hex chars.
pub fn mint_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn mint_session_token(
    claims: &Claims,
    security: &SecurityConfig,
) -> Result<String, SessionTokenError> {
    if security.jwt_secret.is_empty() {
        return Err(SessionTokenError::Mint("JWT secret not configured".to_string()));
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| SessionTokenError::Mint(e.to_string()))
}

pub fn verify_session_token(
    token: &str,
    security: &SecurityConfig,
) -> Result<Claims, SessionTokenError> {
    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[&security.jwt_issuer]);
    validation.set_audience(&[&security.jwt_audience]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => SessionTokenError::Expired,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                SessionTokenError::MalformedIssuerAudience
            }
            _ => SessionTokenError::InvalidSignature(e.to_string()),
        }
    })?;

    Ok(token_data.claims)
}
