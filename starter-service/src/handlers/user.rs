//! User management endpoints. All routes here sit behind the auth guard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use uuid::Uuid;

use service_core::error::AppError;
use service_core::pagination::paginate;
use service_core::response::Reply;
use service_core::utils::ValidatedJson;

use crate::dtos::user::{CreateUserRequest, ListUsersQuery, UpdateUserRequest};
use crate::middleware::AuthUser;
use crate::models::SanitizedUser;
use crate::services::store::{NewUser, UserPages, UserPatch};
use crate::utils::password::hash_password;
use crate::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<Reply, AppError> {
    let password_hash = hash_password(&req.password)?;

    let user = state
        .users
        .create(NewUser {
            user_id: req.user_id,
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    Ok(Reply::plain(SanitizedUser::from(user))?
        .with_status(StatusCode::CREATED)
        .with_message("User created"))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Reply, AppError> {
    let filter = query.filter();
    let source = UserPages {
        store: state.users.as_ref(),
        filter: &filter,
    };

    let page = paginate(&source, &query.page_query()).await?;
    Reply::paginated(page.map(SanitizedUser::from))
}

/// The authenticated caller's own record.
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Reply, AppError> {
    let user = state
        .users
        .find_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Reply::plain(SanitizedUser::from(user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Reply, AppError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Reply::plain(SanitizedUser::from(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Reply, AppError> {
    let password_hash = match &req.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = state
        .users
        .update(
            id,
            UserPatch {
                name: req.name,
                email: req.email,
                password_hash,
            },
        )
        .await?;

    Reply::plain(SanitizedUser::from(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Reply, AppError> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    state.users.delete(id).await?;

    Reply::plain(json!({ "deleted": true }))
}
