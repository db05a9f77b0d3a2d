//! Identity store collaborator: the seam between handlers and storage.
//!
//! Handlers only ever talk to [`IdentityStore`]; the Postgres implementation
//! lives in [`super::database`] and the tests provide an in-memory one.

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use service_core::error::AppError;
use service_core::pagination::PageSource;

use crate::models::User;

/// Fields for a new identity. The password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Whitelisted sort keys for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserSortKey {
    #[default]
    Id,
    UserId,
    Name,
    Email,
    CreatedAt,
}

impl UserSortKey {
    pub fn column(&self) -> &'static str {
        match self {
            UserSortKey::Id => "id",
            UserSortKey::UserId => "user_id",
            UserSortKey::Name => "name",
            UserSortKey::Email => "email",
            UserSortKey::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Listing filter: optional substring search over userId/name/email plus
/// ordering.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub sort_by: UserSortKey,
    pub sort_order: SortOrder,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn create(&self, fields: NewUser) -> Result<User, AppError>;
    async fn update(&self, id: Uuid, fields: UserPatch) -> Result<User, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    async fn list(&self, filter: &UserFilter, skip: u64, take: Option<u64>)
        -> Result<Vec<User>, AppError>;
    async fn count(&self, filter: &UserFilter) -> Result<u64, AppError>;
}

/// Adapter exposing one filtered user listing as a paginatable source.
pub struct UserPages<'a> {
    pub store: &'a dyn IdentityStore,
    pub filter: &'a UserFilter,
}

#[async_trait]
impl PageSource for UserPages<'_> {
    type Item = User;

    async fn fetch(&self, skip: u64, take: Option<u64>) -> Result<Vec<User>, AppError> {
        self.store.list(self.filter, skip, take).await
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.store.count(self.filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_map_to_columns() {
        assert_eq!(UserSortKey::UserId.column(), "user_id");
        assert_eq!(UserSortKey::default().column(), "id");
        assert_eq!(SortOrder::default().sql(), "DESC");
    }

    #[test]
    fn sort_keys_deserialize_from_camel_case() {
        let key: UserSortKey = serde_json::from_str("\"createdAt\"").unwrap();
        assert_eq!(key, UserSortKey::CreatedAt);
        let order: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(order, SortOrder::Asc);
    }
}
