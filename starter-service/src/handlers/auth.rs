//! Authentication endpoints: login, refresh and token introspection. All
//! three are public; the guard never runs here.

use axum::extract::State;

use service_core::error::{AppError, AuthFailure};
use service_core::response::Reply;
use service_core::utils::ValidatedJson;

use crate::dtos::auth::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, ValidateRequest, ValidateResponse,
};
use crate::services::TokenError;
use crate::utils::{password::verify_password, strip_whitespace};
use crate::AppState;

/// Exchange credentials for an access/refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Reply, AppError> {
    let user_id = strip_whitespace(&req.user_id);

    let user = state
        .users
        .find_by_user_id(&user_id)
        .await?
        .ok_or(AppError::Unauthenticated(AuthFailure::BadCredentials))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthenticated(AuthFailure::BadCredentials));
    }

    let access_token = state.jwt.issue_access(&user)?;
    let refresh_token = state.jwt.issue_refresh(&user)?;

    Reply::plain(LoginResponse::new(user, access_token, refresh_token))
}

/// Re-issue an access token from a refresh token. The embedded identity must
/// match the request's `userId`; the refresh token itself is not rotated.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Reply, AppError> {
    let claims = state.jwt.verify_refresh(&req.refresh_token).map_err(|e| {
        AppError::Unauthenticated(match e {
            TokenError::Expired => AuthFailure::RefreshExpired,
            TokenError::Invalid => AuthFailure::RefreshInvalid,
        })
    })?;

    let user_id = strip_whitespace(&req.user_id);
    if claims.user_id.trim() != user_id {
        return Err(AppError::Unauthenticated(AuthFailure::IdentityMismatch));
    }

    let user = state
        .users
        .find_by_user_id(&user_id)
        .await?
        .ok_or(AppError::Unauthenticated(AuthFailure::UnknownUser))?;

    let access_token = state.jwt.issue_access(&user)?;

    Reply::plain(RefreshResponse {
        user_id: user.user_id,
        access_token,
    })
}

/// Verify an access token and return its claims.
pub async fn validate(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ValidateRequest>,
) -> Result<Reply, AppError> {
    let claims = state.jwt.verify_access(&req.token)?;
    Reply::plain(ValidateResponse { claims })
}
