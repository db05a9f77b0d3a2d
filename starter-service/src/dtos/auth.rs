use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::User;
use crate::services::Claims;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Successful login: the sanitized identity plus both tokens. The token keys
/// stay snake_case by convention, everything else is camelCase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub user_id: String,
    pub name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "access_token")]
    pub access_token: String,
    #[serde(rename = "refresh_token")]
    pub refresh_token: String,
}

impl LoginResponse {
    pub fn new(user: User, access_token: String, refresh_token: String) -> Self {
        LoginResponse {
            id: user.id,
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
            access_token,
            refresh_token,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,

    #[validate(length(min = 1, message = "refreshToken is required"))]
    pub refresh_token: String,
}

/// Only a fresh access token is issued; the refresh token is not rotated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub user_id: String,
    #[serde(rename = "access_token")]
    pub access_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    #[serde(flatten)]
    pub claims: Claims,
}
