//! Stateless token issuance and verification.
//!
//! Access and refresh tokens are HS256-signed with independent secrets and
//! TTLs. There is no server-side token store: expiry is the only revocation
//! mechanism, so rotating a secret is the only way to force a global logout.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use service_core::error::{AppError, AuthFailure};

use crate::config::JwtConfig;
use crate::models::User;

/// Signed claim carried by both token kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Internal identity id.
    pub sub: Uuid,
    /// Login handle, echoed so the refresh flow can cross-check it.
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::Unauthenticated(AuthFailure::TokenExpired),
            TokenError::Invalid => AppError::Unauthenticated(AuthFailure::TokenInvalid),
        }
    }
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl KeyPair {
    fn from_secret(secret: &str, ttl_secs: i64) -> Self {
        KeyPair {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        JwtService {
            access: KeyPair::from_secret(&config.access_secret, config.access_ttl_secs),
            refresh: KeyPair::from_secret(&config.refresh_secret, config.refresh_ttl_secs),
        }
    }

    pub fn issue_access(&self, user: &User) -> Result<String, AppError> {
        self.issue(&self.access, user)
    }

    pub fn issue_refresh(&self, user: &User) -> Result<String, AppError> {
        self.issue(&self.refresh, user)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, &self.access.decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, &self.refresh.decoding)
    }

    fn issue(&self, keys: &KeyPair, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            user_id: user.user_id.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(keys.ttl_secs)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Unexpected(anyhow::anyhow!("failed to sign token: {e}")))
    }
}

fn verify(token: &str, key: &DecodingKey) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // no leeway: an expired token is expired the second it expires
    validation.leeway = 0;

    let data = decode::<Claims>(token, key, &validation)?;
    Ok(data.claims)
}
