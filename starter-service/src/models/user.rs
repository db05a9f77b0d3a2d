//! User identity records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored identity. `user_id` is the login handle chosen at registration;
/// `id` is the internal key. The password hash never leaves this type except
/// through the store.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_id: String,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing projection of a user, with credentials stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: Uuid,
    pub user_id: String,
    pub name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for SanitizedUser {
    fn from(user: User) -> Self {
        SanitizedUser {
            id: user.id,
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_user_has_no_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            user_id: "USER_20250815001".to_string(),
            name: Some("Kyaw Soe".to_string()),
            email: "kyawsoe@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(SanitizedUser::from(user)).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(keys.contains(&"userId"));
        assert!(keys.contains(&"createdAt"));
        assert!(!keys.iter().any(|k| k.to_lowercase().contains("password")));
    }
}
