//! Per-request authentication gate for protected route groups.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use service_core::error::{AppError, AuthFailure};

use crate::AppState;

/// The identity attached to a request once its bearer token verifies.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub user_id: String,
}

/// Gate protected routes: extract the bearer token, verify it against the
/// access secret, and attach the resolved identity. Public routes are simply
/// assembled without this layer.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthenticated(AuthFailure::MissingToken))?;

    let claims = state.jwt.verify_access(token)?;

    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        user_id: claims.user_id,
    });

    Ok(next.run(req).await)
}

/// Extractor for handlers that need the authenticated identity.
pub struct AuthUser(pub CurrentUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated(AuthFailure::MissingToken))?;
        Ok(AuthUser(user))
    }
}
