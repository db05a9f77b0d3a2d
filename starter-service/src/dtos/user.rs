use serde::Deserialize;
use validator::Validate;

use service_core::pagination::{PageQuery, DEFAULT_LIMIT, DEFAULT_PAGE};

use crate::services::store::{SortOrder, UserFilter, UserSortKey};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,

    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Listing parameters: pagination plus optional search and ordering. The
/// pagination fields are spelled out flat because query-string deserializers
/// cannot see through `flatten` for non-string primitives.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub all: Option<bool>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: UserSortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ListUsersQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page.unwrap_or(DEFAULT_PAGE),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
            all: self.all.unwrap_or(false),
        }
    }

    pub fn filter(&self) -> UserFilter {
        UserFilter {
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults() {
        let query: ListUsersQuery = serde_urlencoded::from_str("").unwrap();
        let page = query.page_query();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 20);
        assert!(!page.all);

        let filter = query.filter();
        assert_eq!(filter.search, None);
        assert_eq!(filter.sort_by, UserSortKey::Id);
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }

    #[test]
    fn list_query_parses_from_query_string() {
        let query: ListUsersQuery =
            serde_urlencoded::from_str("page=2&limit=5&search=kyaw&sortBy=createdAt&sortOrder=asc")
                .unwrap();
        assert_eq!(query.page_query().page, 2);
        assert_eq!(query.page_query().limit, 5);
        assert_eq!(query.filter().search.as_deref(), Some("kyaw"));
        assert_eq!(query.filter().sort_by, UserSortKey::CreatedAt);
        assert_eq!(query.filter().sort_order, SortOrder::Asc);
    }

    #[test]
    fn blank_search_is_dropped() {
        let query: ListUsersQuery = serde_urlencoded::from_str("search=%20%20").unwrap();
        assert_eq!(query.filter().search, None);
    }
}
